//! Heading anchor generation.

use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

fn hyphen_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("static regex"))
}

/// Convert heading text to an id usable as a URL fragment
///
/// Letters of any script survive, so a German heading keeps its umlauts and
/// a Japanese heading keeps its kana.
///
/// # Examples
///
/// ```
/// use polysite_core::slugify;
///
/// assert_eq!(slugify("Über uns"), "über-uns");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// ```
pub fn slugify(input: &str) -> String {
    let cleaned = input
        .to_lowercase()
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if matches!(g, " " | "_" | "\t" | "\n") {
                Some("-")
            } else if c.is_alphanumeric() || c == '-' {
                Some(g)
            } else {
                None
            }
        })
        .collect::<String>();

    hyphen_runs()
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}
