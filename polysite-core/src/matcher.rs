//! Per-page language negotiation.
//!
//! Given the tags a page actually has fragments for, pick the best one for
//! each requested output tag:
//!
//! 1. exact match (tags compare case-insensitively)
//! 2. the requested tag's truncations (`de-CH-1996`, `de-CH`, `de`)
//! 3. any available tag sharing the primary language, preferring the same
//!    script, then the same region, then the shortest tag, then file order
//! 4. the first available tag

use language_tags::LanguageTag;

/// How a tag was chosen, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Exact,
    Ancestor,
    SameLanguage,
    Default,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Exact => "exact",
            Confidence::Ancestor => "ancestor",
            Confidence::SameLanguage => "same-language",
            Confidence::Default => "default",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Matcher {
    available: Vec<LanguageTag>,
}

impl Matcher {
    /// Returns `None` when nothing is available to match against.
    pub fn new(available: Vec<LanguageTag>) -> Option<Self> {
        if available.is_empty() {
            None
        } else {
            Some(Self { available })
        }
    }

    /// Index into the available tags of the best match for `requested`.
    pub fn best_match(&self, requested: &LanguageTag) -> (usize, Confidence) {
        if let Some(index) = self.position(requested.as_str()) {
            return (index, Confidence::Exact);
        }

        for ancestor in truncations(requested.as_str()) {
            if let Some(index) = self.position(ancestor) {
                return (index, Confidence::Ancestor);
            }
        }

        let same_language = self
            .available
            .iter()
            .enumerate()
            .filter(|(_, tag)| {
                tag.primary_language()
                    .eq_ignore_ascii_case(requested.primary_language())
            })
            .min_by_key(|(index, tag)| {
                (
                    !subtag_eq(tag.script(), requested.script()),
                    !subtag_eq(tag.region(), requested.region()),
                    tag.as_str().split('-').count(),
                    *index,
                )
            });
        if let Some((index, _)) = same_language {
            return (index, Confidence::SameLanguage);
        }

        (0, Confidence::Default)
    }

    fn position(&self, tag: &str) -> Option<usize> {
        self.available
            .iter()
            .position(|t| t.as_str().eq_ignore_ascii_case(tag))
    }
}

fn subtag_eq(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

/// Successively shorter prefixes of a tag, never ending on a singleton.
fn truncations(tag: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut current = tag;
    while let Some(pos) = current.rfind('-') {
        current = &current[..pos];
        let last = current.rsplit('-').next().unwrap_or(current);
        if last.len() == 1 {
            // drop extension/private-use singletons along with their subtags
            continue;
        }
        result.push(current);
    }
    result
}
