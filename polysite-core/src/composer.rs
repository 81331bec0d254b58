//! Template composition: shared skeletons plus one fragment per page and
//! language.
//!
//! Skeletons are parsed once into a base [`Tera`] set. Every composed page
//! gets its own clone of that set with one extra template that extends the
//! entry skeleton and overrides its `content` block with the fragment markup.

use crate::scanner::Fragment;
use regex::Regex;
use std::sync::OnceLock;
use tera::{Context, Tera};
use thiserror::Error;

/// Name of the block every page overrides.
pub const CONTENT_BLOCK: &str = "content";

/// Name of the per-page template inside each composed set.
const PAGE_TEMPLATE: &str = "__polysite_page.html";

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Failed to parse template set: {0}")]
    Parse(#[source] tera::Error),

    #[error("Entry template {0:?} not found among skeleton templates")]
    MissingEntry(String),

    #[error("No skeleton template declares a {{% block content %}}")]
    MissingContentBlock,

    #[error("Failed to compose page {page:?} from {file:?}: {source}")]
    Fragment {
        page: String,
        file: String,
        #[source]
        source: tera::Error,
    },
}

/// A named template source.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    pub name: String,
    pub body: String,
}

impl TemplateSource {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

fn content_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{%-?\s*block\s+content\s*-?%\}").expect("static regex"))
}

/// The shared base template set.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    tera: Tera,
    entry: String,
}

impl TemplateSet {
    /// Parse skeletons and application templates into one set.
    pub fn new(sources: &[TemplateSource], entry: &str) -> Result<Self, ComposeError> {
        if !sources.iter().any(|s| content_block().is_match(&s.body)) {
            return Err(ComposeError::MissingContentBlock);
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources.iter().map(|s| (s.name.as_str(), s.body.as_str())))
            .map_err(ComposeError::Parse)?;

        if !tera.get_template_names().any(|name| name == entry) {
            return Err(ComposeError::MissingEntry(entry.to_string()));
        }

        Ok(Self {
            tera,
            entry: entry.to_string(),
        })
    }

    /// Clone the set and bind `fragment` to its content block.
    pub fn compose(&self, fragment: &Fragment) -> Result<ComposedTemplate, ComposeError> {
        let mut tera = self.tera.clone();
        let page = format!(
            "{{% extends \"{entry}\" %}}{{% block {block} %}}{markup}{{% endblock {block} %}}",
            entry = self.entry,
            block = CONTENT_BLOCK,
            markup = fragment.markup,
        );
        tera.add_raw_template(PAGE_TEMPLATE, &page)
            .map_err(|source| ComposeError::Fragment {
                page: fragment.page.clone(),
                file: fragment.file.clone(),
                source,
            })?;
        Ok(ComposedTemplate { tera })
    }
}

/// A page-and-language specific template, ready to execute.
///
/// Rendering borrows the template immutably, so one value can serve any
/// number of concurrent requests.
#[derive(Debug, Clone)]
pub struct ComposedTemplate {
    tera: Tera,
}

impl ComposedTemplate {
    pub fn render(&self, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(PAGE_TEMPLATE, context)
    }
}
