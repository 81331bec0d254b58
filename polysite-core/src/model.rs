//! The immutable build artifact shared by dynamic serving and static export.

use crate::composer::ComposedTemplate;
use crate::language::Language;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tera::Context;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Failed to render {route}: {source}")]
pub struct RenderError {
    pub route: String,
    #[source]
    pub source: tera::Error,
}

/// Data every page template is executed with.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    /// The language this page is rendered in
    pub lang: Language,
    /// All languages with the current one selected; empty for single-language sites
    pub languages: Vec<Language>,
    /// Page path without language prefix, e.g. `about.html`
    pub path: String,
}

impl TemplateData {
    /// `<link rel="alternate" hreflang>` elements for every sibling language,
    /// the selected one included, one per line.
    pub fn hreflangs(&self) -> String {
        let mut out = String::new();
        for l in &self.languages {
            let _ = writeln!(
                out,
                r#"<link rel="alternate" hreflang="{}" href="/{}/{}">"#,
                l.tag, l.prefix, self.path
            );
        }
        out
    }

    /// Template context: the serialized fields plus `hreflangs`.
    ///
    /// Applications that need extra data start from this context and insert
    /// their own keys.
    pub fn to_context(&self) -> Context {
        let mut ctx = Context::new();
        ctx.insert("lang", &self.lang);
        ctx.insert("languages", &self.languages);
        ctx.insert("path", &self.path);
        ctx.insert("hreflangs", &self.hreflangs());
        ctx
    }
}

/// One dynamic page: a composed template plus its data.
#[derive(Debug)]
pub struct PageEntry {
    /// Page directory name
    pub page: String,
    /// Tag of the fragment chosen for this language
    pub fragment_tag: String,
    pub template: ComposedTemplate,
    pub data: TemplateData,
}

impl PageEntry {
    /// Canonical output path, `<prefix>/<page>.html`
    pub fn route(&self) -> String {
        format!("{}/{}", self.data.lang.prefix, self.data.path)
    }

    /// Execute with the entry's own data.
    pub fn render(&self) -> Result<String, RenderError> {
        self.render_with(&self.data.to_context())
    }

    /// Execute with caller-supplied data.
    pub fn render_with(&self, context: &Context) -> Result<String, RenderError> {
        self.template
            .render(context)
            .map_err(|source| RenderError {
                route: self.route(),
                source,
            })
    }
}

/// Capability implemented by each way of executing a [`WebsiteModel`].
pub trait SiteRenderer {
    type Error;

    /// A pass-through entry; `source` is its location under the content root.
    fn passthrough(&mut self, name: &str, source: &Path) -> Result<(), Self::Error>;

    /// A dynamic page at its canonical output path.
    fn page(&mut self, route: &str, entry: &Arc<PageEntry>) -> Result<(), Self::Error>;
}

/// Everything needed to serve or export the site. Built once, never mutated.
#[derive(Debug)]
pub struct WebsiteModel {
    dynamic: BTreeMap<String, Arc<PageEntry>>,
    passthrough: BTreeSet<String>,
    content_root: PathBuf,
    skipped: Vec<String>,
}

impl WebsiteModel {
    pub(crate) fn new(
        dynamic: BTreeMap<String, Arc<PageEntry>>,
        passthrough: BTreeSet<String>,
        content_root: PathBuf,
        skipped: Vec<String>,
    ) -> Self {
        Self {
            dynamic,
            passthrough,
            content_root,
            skipped,
        }
    }

    /// Dynamic pages keyed by canonical output path
    pub fn pages(&self) -> &BTreeMap<String, Arc<PageEntry>> {
        &self.dynamic
    }

    pub fn page(&self, route: &str) -> Option<&Arc<PageEntry>> {
        self.dynamic.get(route.trim_start_matches('/'))
    }

    /// Pass-through names, relative to the content root
    pub fn passthrough(&self) -> &BTreeSet<String> {
        &self.passthrough
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Page directories left out because they had no fragment
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Drive a renderer over the model: pass-through entries, then pages,
    /// each in sorted order. Stops at the first error.
    pub fn render_with<R: SiteRenderer>(&self, renderer: &mut R) -> Result<(), R::Error> {
        for name in &self.passthrough {
            renderer.passthrough(name, &self.content_root.join(name))?;
        }
        for (route, entry) in &self.dynamic {
            renderer.page(route, entry)?;
        }
        Ok(())
    }
}
