//! # polysite-core
//!
//! Site-assembly engine for multilingual websites.
//!
//! A content root holds shared skeleton templates, one directory per page
//! with translated fragments (`en.md`, `de-CH.html`, ...), and pass-through
//! assets. [`SiteBuilder`] turns it into a [`WebsiteModel`]: one composed
//! template per page and output language, keyed by `<prefix>/<page>.html`.
//! The model is immutable and drives both dynamic serving and static export
//! through [`SiteRenderer`].

pub mod builder;
pub mod composer;
pub mod config;
pub mod language;
pub mod markdown;
pub mod matcher;
pub mod model;
pub mod scanner;
pub mod slug;

pub use builder::{BuildError, SiteBuilder};
pub use composer::{ComposeError, ComposedTemplate, TemplateSet, TemplateSource, CONTENT_BLOCK};
pub use config::{Config, ConfigError, EmptyPagePolicy, DEFAULT_PASSTHROUGH};
pub use language::{Language, LanguageError, LanguageRegistry, LanguageSpec};
pub use markdown::MarkdownProcessor;
pub use matcher::{Confidence, Matcher};
pub use model::{PageEntry, RenderError, SiteRenderer, TemplateData, WebsiteModel};
pub use scanner::{EntryKind, Fragment, Page, ScanError, Scanner};
pub use slug::slugify;

pub use tera;
