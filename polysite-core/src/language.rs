//! Output languages and the registry that holds them.

use language_tags::LanguageTag;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LanguageError {
    #[error("No output language configured")]
    Empty,

    #[error("Invalid language tag {tag:?}: {source}")]
    InvalidTag {
        tag: String,
        #[source]
        source: language_tags::ParseError,
    },

    #[error("Invalid prefix {prefix:?} for {tag}: must be a single path segment")]
    InvalidPrefix { tag: String, prefix: String },

    #[error("Duplicate language prefix {0:?} (set an explicit prefix)")]
    DuplicatePrefix(String),
}

/// One configured output language, as written in polysite.yml.
///
/// Either a bare tag (`de`) or a table with optional prefix and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageSpec {
    Tag(String),
    Detailed {
        tag: String,
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl LanguageSpec {
    pub fn tag(&self) -> &str {
        match self {
            LanguageSpec::Tag(tag) => tag,
            LanguageSpec::Detailed { tag, .. } => tag,
        }
    }
}

impl From<&str> for LanguageSpec {
    fn from(tag: &str) -> Self {
        LanguageSpec::Tag(tag.to_string())
    }
}

/// An output language. Templates see `tag`, `prefix`, `name` and `selected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Language {
    /// BCP-47 tag as configured
    pub tag: String,
    /// Output path segment, e.g. `en` in `/en/about.html`
    pub prefix: String,
    pub name: String,
    pub selected: bool,

    #[serde(skip)]
    parsed: LanguageTag,
}

impl Language {
    fn from_spec(spec: &LanguageSpec) -> Result<Self, LanguageError> {
        let (tag, prefix, name) = match spec {
            LanguageSpec::Tag(tag) => (tag.trim(), None, None),
            LanguageSpec::Detailed { tag, prefix, name } => {
                (tag.trim(), prefix.as_deref(), name.as_deref())
            }
        };

        let parsed = LanguageTag::parse(tag).map_err(|source| LanguageError::InvalidTag {
            tag: tag.to_string(),
            source,
        })?;

        let prefix = prefix
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| parsed.primary_language().to_ascii_lowercase());
        if !is_path_segment(&prefix) {
            return Err(LanguageError::InvalidPrefix {
                tag: tag.to_string(),
                prefix,
            });
        }

        let name = name
            .map(|n| n.to_string())
            .unwrap_or_else(|| prefix.to_uppercase());

        Ok(Self {
            tag: tag.to_string(),
            prefix,
            name,
            selected: false,
            parsed,
        })
    }

    /// The parsed BCP-47 tag
    pub fn language_tag(&self) -> &LanguageTag {
        &self.parsed
    }
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.starts_with('.')
        && !s.chars().any(|c| c == '/' || c == '\\' || c.is_whitespace())
}

/// Ordered, immutable list of output languages.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
}

impl LanguageRegistry {
    pub fn new<'a>(specs: impl IntoIterator<Item = &'a LanguageSpec>) -> Result<Self, LanguageError> {
        let mut languages = Vec::new();
        let mut prefixes = HashSet::new();

        for spec in specs {
            let language = Language::from_spec(spec)?;
            if !prefixes.insert(language.prefix.clone()) {
                return Err(LanguageError::DuplicatePrefix(language.prefix));
            }
            languages.push(language);
        }

        if languages.is_empty() {
            return Err(LanguageError::Empty);
        }

        Ok(Self { languages })
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn by_prefix(&self, prefix: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.prefix == prefix)
    }

    /// Languages for switchers and hreflang links, with `selected` marked.
    ///
    /// Empty when only one language is configured.
    pub fn siblings(&self, selected: &Language) -> Vec<Language> {
        if self.languages.len() < 2 {
            return Vec::new();
        }
        self.languages
            .iter()
            .map(|l| Language {
                selected: l.prefix == selected.prefix,
                ..l.clone()
            })
            .collect()
    }
}
