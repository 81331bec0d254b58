//! Markdown to HTML conversion for page fragments.

use crate::slug::slugify;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashSet;

/// Markdown processor used once per fragment at scan time
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }

    /// Convert markdown to HTML. Raw HTML blocks pass through untouched.
    pub fn convert(&self, markdown: &str) -> String {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();
        let events = attach_heading_ids(events);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Give every heading without an explicit `{#id}` a slug of its text.
///
/// Repeated slugs get `-1`, `-2`, ... so ids stay unique within a fragment.
fn attach_heading_ids(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut titles = Vec::new();
    let mut taken = HashSet::new();
    let mut current: Option<String> = None;
    for event in &events {
        match event {
            Event::Start(Tag::Heading { id, .. }) => {
                if let Some(id) = id {
                    taken.insert(id.to_string());
                }
                current = Some(String::new());
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(title) = current.as_mut() {
                    title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(title) = current.take() {
                    titles.push(slugify(&title));
                }
            }
            _ => {}
        }
    }

    let mut titles = titles.into_iter();
    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let slug = titles.next().unwrap_or_default();
                let id = match id {
                    Some(id) => Some(id),
                    None if slug.is_empty() => None,
                    None => Some(CowStr::from(unique_id(slug, &mut taken))),
                };
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                })
            }
            other => other,
        })
        .collect()
}

fn unique_id(slug: String, taken: &mut HashSet<String>) -> String {
    let mut candidate = slug.clone();
    let mut n = 0;
    while taken.contains(&candidate) {
        n += 1;
        candidate = format!("{slug}-{n}");
    }
    taken.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let processor = MarkdownProcessor::new();
        let html = processor.convert("# Hello World\n\nThis is a **test**.");
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains("<strong>test</strong>"));
    }

    #[test]
    fn test_explicit_heading_id_wins() {
        let processor = MarkdownProcessor::new();
        let html = processor.convert("## Kontakt {#contact}\n");
        assert!(html.contains(r#"<h2 id="contact">Kontakt</h2>"#));
    }

    #[test]
    fn test_repeated_headings_get_distinct_ids() {
        let processor = MarkdownProcessor::new();
        let html = processor.convert("## FAQ\n\n## FAQ\n\n## FAQ\n\n## Other {#faq-1}\n");
        assert!(html.contains(r#"<h2 id="faq">FAQ</h2>"#));
        assert!(html.contains(r#"<h2 id="faq-2">FAQ</h2>"#));
        assert!(html.contains(r#"<h2 id="faq-3">FAQ</h2>"#));
        assert!(html.contains(r#"<h2 id="faq-1">Other</h2>"#));
        assert_eq!(html.matches("id=\"faq-1\"").count(), 1);
    }

    #[test]
    fn test_raw_html_passes_through() {
        let processor = MarkdownProcessor::new();
        let html = processor.convert("<div class=\"widget\">checkout</div>\n\ntext");
        assert!(html.contains("<div class=\"widget\">checkout</div>"));
    }

    #[test]
    fn test_tables() {
        let processor = MarkdownProcessor::new();
        let md = r#"
| Header 1 | Header 2 |
|----------|----------|
| Cell 1   | Cell 2   |
"#;
        let html = processor.convert(md);
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Header 1</th>"));
    }
}
