//! Content tree discovery.
//!
//! The content root is read one level deep. Each top-level entry is either
//! ignored (hidden), passed through verbatim (allow-listed name), a page
//! directory, or a skeleton template source. Page directories are then read
//! for their translated fragments.

use crate::markdown::MarkdownProcessor;
use language_tags::LanguageTag;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to read content root {path:?}: {source}")]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read page directory {page:?}: {source}")]
    ReadPage {
        page: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {file:?} in page {page:?}: {source}")]
    ReadFile {
        page: String,
        file: String,
        #[source]
        source: io::Error,
    },

    #[error("File {file:?} in page {page:?} is not named after a BCP-47 tag: {source}")]
    InvalidTag {
        page: String,
        file: String,
        #[source]
        source: language_tags::ParseError,
    },

    #[error("Page {page:?} has two fragments for {tag}: {first:?} and {second:?}")]
    DuplicateFragment {
        page: String,
        tag: String,
        first: String,
        second: String,
    },
}

/// What a directory entry is once a symlink has been followed one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Dangling link, link to a link, or a special file
    Other,
}

/// Classify `path` without recursing into symlink chains.
///
/// A symlink is read once and its target inspected with `symlink_metadata`,
/// so a link pointing at another link resolves to [`EntryKind::Other`].
pub fn entry_kind(path: &Path) -> io::Result<EntryKind> {
    let meta = fs::symlink_metadata(path)?;
    let file_type = if meta.file_type().is_symlink() {
        let target = fs::read_link(path)?;
        let target = match path.parent() {
            Some(parent) if target.is_relative() => parent.join(target),
            _ => target,
        };
        match fs::symlink_metadata(&target) {
            Ok(meta) => meta.file_type(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(EntryKind::Other),
            Err(err) => return Err(err),
        }
    } else {
        meta.file_type()
    };

    Ok(if file_type.is_dir() {
        EntryKind::Dir
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    })
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Result of classifying the content root.
#[derive(Debug, Default, Clone)]
pub struct RootScan {
    /// Allow-listed names found at the root, served and copied verbatim
    pub passthrough: BTreeSet<String>,
    /// Page directory names, sorted
    pub pages: Vec<String>,
    /// Skeleton template files, sorted by name
    pub skeletons: Vec<PathBuf>,
}

/// One page's translated content for one language tag.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub page: String,
    pub tag: LanguageTag,
    /// Source file name inside the page directory
    pub file: String,
    /// HTML (markdown already converted)
    pub markup: String,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub name: String,
    /// Fragments in file-name order
    pub fragments: Vec<Fragment>,
}

impl Page {
    pub fn tags(&self) -> Vec<LanguageTag> {
        self.fragments.iter().map(|f| f.tag.clone()).collect()
    }
}

/// Reads a content root according to the allow-list and template extensions.
pub struct Scanner<'a> {
    root: &'a Path,
    passthrough: &'a [String],
    template_extensions: &'a [String],
    processor: MarkdownProcessor,
}

impl<'a> Scanner<'a> {
    pub fn new(root: &'a Path, passthrough: &'a [String], template_extensions: &'a [String]) -> Self {
        Self {
            root,
            passthrough,
            template_extensions,
            processor: MarkdownProcessor::new(),
        }
    }

    fn is_template(&self, ext: &str) -> bool {
        self.template_extensions.iter().any(|e| e == ext)
    }

    /// Classify the top-level entries of the content root.
    pub fn scan_root(&self) -> Result<RootScan, ScanError> {
        let read_root = |source| ScanError::ReadRoot {
            path: self.root.to_path_buf(),
            source,
        };

        let mut scan = RootScan::default();
        for entry in fs::read_dir(self.root).map_err(read_root)? {
            let entry = entry.map_err(read_root)?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if is_hidden(&name) {
                continue;
            }
            if self.passthrough.iter().any(|p| *p == name) {
                tracing::debug!("Pass-through: {}", name);
                scan.passthrough.insert(name);
                continue;
            }

            match entry_kind(&entry.path()).map_err(read_root)? {
                EntryKind::Dir => {
                    tracing::debug!("Page: {}", name);
                    scan.pages.push(name);
                }
                EntryKind::File => {
                    let ext = Path::new(&name).extension().and_then(|e| e.to_str());
                    if ext.is_some_and(|ext| self.is_template(ext)) {
                        tracing::debug!("Skeleton: {}", name);
                        scan.skeletons.push(entry.path());
                    } else {
                        tracing::debug!("Ignoring root file {}", name);
                    }
                }
                EntryKind::Other => {
                    tracing::warn!("Ignoring {:?}: not a file or directory", entry.path());
                }
            }
        }

        scan.pages.sort();
        scan.skeletons.sort();
        Ok(scan)
    }

    /// Read every translatable fragment inside one page directory.
    ///
    /// Markdown is converted here, once per fragment.
    pub fn scan_page(&self, name: &str) -> Result<Page, ScanError> {
        let dir = self.root.join(name);
        let read_page = |source| ScanError::ReadPage {
            page: name.to_string(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(read_page)? {
            let entry = entry.map_err(read_page)?;
            let file = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&file) {
                continue;
            }
            if entry_kind(&entry.path()).map_err(read_page)? != EntryKind::File {
                continue;
            }
            files.push(file);
        }
        files.sort();

        let mut fragments: Vec<Fragment> = Vec::new();
        for file in files {
            let path = Path::new(&file);
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|e| e.to_str()),
            ) else {
                continue;
            };
            let is_markdown = ext == "md";
            if !is_markdown && !self.is_template(ext) {
                tracing::debug!("Ignoring {}/{}", name, file);
                continue;
            }

            let tag = LanguageTag::parse(stem).map_err(|source| ScanError::InvalidTag {
                page: name.to_string(),
                file: file.clone(),
                source,
            })?;

            if let Some(existing) = fragments
                .iter()
                .find(|f| f.tag.as_str().eq_ignore_ascii_case(tag.as_str()))
            {
                return Err(ScanError::DuplicateFragment {
                    page: name.to_string(),
                    tag: tag.to_string(),
                    first: existing.file.clone(),
                    second: file,
                });
            }

            let source = fs::read_to_string(dir.join(&file)).map_err(|source| {
                ScanError::ReadFile {
                    page: name.to_string(),
                    file: file.clone(),
                    source,
                }
            })?;
            let markup = if is_markdown {
                self.processor.convert(&source)
            } else {
                source
            };

            fragments.push(Fragment {
                page: name.to_string(),
                tag,
                file,
                markup,
            });
        }

        Ok(Page {
            name: name.to_string(),
            fragments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn passthrough() -> Vec<String> {
        crate::config::DEFAULT_PASSTHROUGH
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn html() -> Vec<String> {
        vec!["html".to_string()]
    }

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_classifies_root_entries() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "layout.html", "skeleton");
        write(root, "notes.txt", "ignored");
        write(root, ".hidden/en.md", "hidden page");
        write(root, "ads.txt", "passthrough file");
        write(root, "assets/app.css", "body{}");
        write(root, "about/en.md", "# About");

        let (pt, ext) = (passthrough(), html());
        let scan = Scanner::new(root, &pt, &ext).scan_root().unwrap();

        assert_eq!(scan.pages, vec!["about".to_string()]);
        assert_eq!(
            scan.passthrough.iter().cloned().collect::<Vec<_>>(),
            vec!["ads.txt".to_string(), "assets".to_string()]
        );
        assert_eq!(scan.skeletons, vec![root.join("layout.html")]);
    }

    #[test]
    fn test_passthrough_takes_precedence_over_page() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        // Looks like a page directory but is allow-listed
        write(root, "images/en.md", "# not a page");

        let (pt, ext) = (passthrough(), html());
        let scan = Scanner::new(root, &pt, &ext).scan_root().unwrap();

        assert!(scan.pages.is_empty());
        assert!(scan.passthrough.contains("images"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_a_page() {
        let dir = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        write(shared.path(), "en.md", "# Shared");
        std::os::unix::fs::symlink(shared.path(), dir.path().join("shared")).unwrap();
        std::os::unix::fs::symlink(shared.path().join("en.md"), dir.path().join("skeleton.html"))
            .unwrap();

        let (pt, ext) = (passthrough(), html());
        let scan = Scanner::new(dir.path(), &pt, &ext).scan_root().unwrap();
        assert_eq!(scan.pages, vec!["shared".to_string()]);
        assert_eq!(scan.skeletons, vec![dir.path().join("skeleton.html")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_link_to_link_is_not_followed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("real")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("hop")).unwrap();
        std::os::unix::fs::symlink(root.join("hop"), root.join("chain")).unwrap();

        assert_eq!(entry_kind(&root.join("hop")).unwrap(), EntryKind::Dir);
        assert_eq!(entry_kind(&root.join("chain")).unwrap(), EntryKind::Other);
    }

    #[test]
    fn test_scan_page_reads_fragments() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "about/de.md", "# Über uns");
        write(root, "about/en-US.html", "<p>About</p>");
        write(root, "about/notes.txt", "ignored");
        write(root, "about/.en.md.swp", "ignored");
        write(root, "about/img/en.md", "nested dirs are ignored");

        let (pt, ext) = (passthrough(), html());
        let page = Scanner::new(root, &pt, &ext).scan_page("about").unwrap();

        assert_eq!(page.fragments.len(), 2);
        assert_eq!(page.fragments[0].tag.as_str(), "de");
        assert!(page.fragments[0].markup.contains("<h1"));
        assert_eq!(page.fragments[1].tag.as_str(), "en-US");
        assert_eq!(page.fragments[1].markup, "<p>About</p>");
    }

    #[test]
    fn test_invalid_tag_names_file_and_page() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "about/en_US.md", "# About");

        let (pt, ext) = (passthrough(), html());
        let err = Scanner::new(root, &pt, &ext).scan_page("about").unwrap_err();
        match err {
            ScanError::InvalidTag { page, file, .. } => {
                assert_eq!(page, "about");
                assert_eq!(file, "en_US.md");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_fragment_is_rejected() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "about/en.html", "<p>a</p>");
        write(root, "about/en.md", "b");

        let (pt, ext) = (passthrough(), html());
        let err = Scanner::new(root, &pt, &ext).scan_page("about").unwrap_err();
        assert!(matches!(err, ScanError::DuplicateFragment { .. }));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let (pt, ext) = (passthrough(), html());
        let err = Scanner::new(&missing, &pt, &ext).scan_root().unwrap_err();
        assert!(matches!(err, ScanError::ReadRoot { .. }));
    }
}
