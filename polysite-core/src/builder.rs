//! Site building logic - scans content, negotiates languages, composes
//! templates and assembles the [`WebsiteModel`].

use crate::{
    composer::{ComposeError, TemplateSet, TemplateSource},
    config::{Config, EmptyPagePolicy, DEFAULT_PASSTHROUGH},
    language::{LanguageError, LanguageRegistry},
    matcher::Matcher,
    model::{PageEntry, TemplateData, WebsiteModel},
    scanner::{ScanError, Scanner},
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("Language configuration: {0}")]
    Language(#[from] LanguageError),

    #[error("Failed to read template {path:?}: {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk extra templates in {path:?}: {source}")]
    WalkTemplates {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Page {0:?} has no translatable fragment")]
    EmptyPage(String),

    #[error("Language {tag} uses prefix {prefix:?}, which is also a pass-through entry")]
    PrefixClash { tag: String, prefix: String },
}

/// Assembles a [`WebsiteModel`] from a content root.
pub struct SiteBuilder {
    content_root: PathBuf,
    registry: LanguageRegistry,
    passthrough: Vec<String>,
    template_extensions: Vec<String>,
    entry: String,
    extra_templates: Vec<TemplateSource>,
    empty_pages: EmptyPagePolicy,
}

impl SiteBuilder {
    pub fn new(content_root: impl Into<PathBuf>, registry: LanguageRegistry) -> Self {
        Self {
            content_root: content_root.into(),
            registry,
            passthrough: DEFAULT_PASSTHROUGH.iter().map(|s| s.to_string()).collect(),
            template_extensions: vec![String::from("html")],
            entry: String::from("layout.html"),
            extra_templates: Vec::new(),
            empty_pages: EmptyPagePolicy::default(),
        }
    }

    /// Builder configured from polysite.yml, including extra templates on disk.
    pub fn from_config(config: &Config) -> Result<Self, BuildError> {
        let registry = LanguageRegistry::new(&config.languages)?;
        let mut builder = Self::new(config.content_dir(), registry)
            .passthrough(config.passthrough.clone())
            .template_extensions(config.templates.extensions.clone())
            .entry_template(config.templates.entry.clone())
            .empty_pages(config.empty_pages);

        if let Some(dir) = config.extra_templates_dir() {
            for source in load_template_dir(&dir, &config.templates.extensions)? {
                builder = builder.extra_template(source);
            }
        }

        Ok(builder)
    }

    pub fn passthrough(mut self, names: Vec<String>) -> Self {
        self.passthrough = names;
        self
    }

    pub fn template_extensions(mut self, extensions: Vec<String>) -> Self {
        self.template_extensions = extensions;
        self
    }

    pub fn entry_template(mut self, name: impl Into<String>) -> Self {
        self.entry = name.into();
        self
    }

    /// Add an application-supplied template to the base set.
    pub fn extra_template(mut self, source: TemplateSource) -> Self {
        self.extra_templates.push(source);
        self
    }

    pub fn empty_pages(mut self, policy: EmptyPagePolicy) -> Self {
        self.empty_pages = policy;
        self
    }

    /// Build the model. Any error aborts the whole build.
    pub fn build(&self) -> Result<WebsiteModel, BuildError> {
        let scanner = Scanner::new(
            &self.content_root,
            &self.passthrough,
            &self.template_extensions,
        );
        let scan = scanner.scan_root()?;

        tracing::info!(
            "Found {} pages, {} skeleton templates, {} pass-through entries",
            scan.pages.len(),
            scan.skeletons.len(),
            scan.passthrough.len()
        );

        for language in self.registry.languages() {
            if scan.passthrough.contains(&language.prefix) {
                return Err(BuildError::PrefixClash {
                    tag: language.tag.clone(),
                    prefix: language.prefix.clone(),
                });
            }
        }

        let mut sources = Vec::with_capacity(scan.skeletons.len() + self.extra_templates.len());
        for path in &scan.skeletons {
            sources.push(read_template(path, &self.content_root)?);
        }
        sources.extend(self.extra_templates.iter().cloned());
        let base = TemplateSet::new(&sources, &self.entry)?;

        let mut dynamic = BTreeMap::new();
        let mut skipped = Vec::new();

        for name in &scan.pages {
            let page = scanner.scan_page(name)?;
            let Some(matcher) = Matcher::new(page.tags()) else {
                match self.empty_pages {
                    EmptyPagePolicy::Skip => {
                        tracing::warn!("Skipping {}: no translatable fragment", name);
                        skipped.push(name.clone());
                        continue;
                    }
                    EmptyPagePolicy::Error => return Err(BuildError::EmptyPage(name.clone())),
                }
            };

            let path = format!("{}.html", page.name);
            for language in self.registry.languages() {
                let (index, confidence) = matcher.best_match(language.language_tag());
                let fragment = &page.fragments[index];
                tracing::debug!(
                    "{}: {} -> {} ({})",
                    page.name,
                    language.tag,
                    fragment.file,
                    confidence.as_str()
                );

                let mut current = language.clone();
                current.selected = true;
                let entry = PageEntry {
                    page: page.name.clone(),
                    fragment_tag: fragment.tag.to_string(),
                    template: base.compose(fragment)?,
                    data: TemplateData {
                        lang: current,
                        languages: self.registry.siblings(language),
                        path: path.clone(),
                    },
                };
                dynamic.insert(entry.route(), Arc::new(entry));
            }
        }

        tracing::info!(
            "Built website model with {} pages in {} languages",
            dynamic.len(),
            self.registry.languages().len()
        );

        Ok(WebsiteModel::new(
            dynamic,
            scan.passthrough,
            self.content_root.clone(),
            skipped,
        ))
    }
}

/// Read a template file, naming it by its path relative to `base`.
fn read_template(path: &Path, base: &Path) -> Result<TemplateSource, BuildError> {
    let body = fs::read_to_string(path).map_err(|source| BuildError::ReadTemplate {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Ok(TemplateSource::new(name, body))
}

/// Load every template under `dir`, recursively, sorted by path.
fn load_template_dir(dir: &Path, extensions: &[String]) -> Result<Vec<TemplateSource>, BuildError> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| BuildError::WalkTemplates {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e == ext));
        if matches {
            sources.push(read_template(entry.path(), dir)?);
        }
    }
    tracing::info!("Loaded {} extra templates from {:?}", sources.len(), dir);
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageSpec;
    use tempfile::TempDir;

    const LAYOUT: &str = "<html lang=\"{{ lang.tag }}\">{% block content %}{% endblock content %}</html>";

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn registry(tags: &[&str]) -> LanguageRegistry {
        let specs: Vec<LanguageSpec> = tags.iter().map(|t| LanguageSpec::from(*t)).collect();
        LanguageRegistry::new(&specs).unwrap()
    }

    #[test]
    fn test_read_template_uses_forward_slashes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "checkout/widget.html", "w");
        let source = read_template(&dir.path().join("checkout/widget.html"), dir.path()).unwrap();
        assert_eq!(source.name, "checkout/widget.html");
        assert_eq!(source.body, "w");
    }

    #[test]
    fn test_load_template_dir_filters_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.html", "a");
        write(dir.path(), "nested/b.html", "b");
        write(dir.path(), "readme.txt", "skip");

        let sources = load_template_dir(dir.path(), &["html".to_string()]).unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a.html", "nested/b.html"]);
    }

    #[test]
    fn test_empty_page_policy() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layout.html", LAYOUT);
        write(dir.path(), "about/en.md", "About");
        write(dir.path(), "drafts/notes.txt", "not a fragment");

        let model = SiteBuilder::new(dir.path(), registry(&["en"]))
            .build()
            .unwrap();
        assert_eq!(model.skipped(), &["drafts".to_string()]);
        assert_eq!(model.pages().len(), 1);

        let err = SiteBuilder::new(dir.path(), registry(&["en"]))
            .empty_pages(EmptyPagePolicy::Error)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::EmptyPage(name) if name == "drafts"));
    }

    #[test]
    fn test_prefix_clashing_with_passthrough_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layout.html", LAYOUT);
        write(dir.path(), "about/en.md", "About");
        write(dir.path(), "static/app.css", "body{}");

        let spec = LanguageSpec::Detailed {
            tag: "en".into(),
            prefix: Some("static".into()),
            name: None,
        };
        let err = SiteBuilder::new(dir.path(), LanguageRegistry::new([&spec]).unwrap())
            .build()
            .unwrap_err();
        match err {
            BuildError::PrefixClash { tag, prefix } => {
                assert_eq!(tag, "en");
                assert_eq!(prefix, "static");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Without a static/ entry the same prefix is fine
        fs::remove_dir_all(dir.path().join("static")).unwrap();
        let model = SiteBuilder::new(dir.path(), LanguageRegistry::new([&spec]).unwrap())
            .build()
            .unwrap();
        assert!(model.page("static/about.html").is_some());
    }

    #[test]
    fn test_extra_template_joins_base_set() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layout.html", LAYOUT);
        write(dir.path(), "pay/en.html", "{% include \"checkout.html\" %}");

        let model = SiteBuilder::new(dir.path(), registry(&["en"]))
            .extra_template(TemplateSource::new("checkout.html", "<form>pay</form>"))
            .build()
            .unwrap();
        let html = model.page("/en/pay.html").unwrap().render().unwrap();
        assert_eq!(html, "<html lang=\"en\"><form>pay</form></html>");
    }
}
