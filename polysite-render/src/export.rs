//! Static export: every page written as a file, pass-through entries copied.
//!
//! The destination must resolve strictly below a safe root and must not
//! overlap the content root the model was built from. It is wiped
//! before writing, and wiped again if any page or copy fails, so an export
//! either completes or leaves nothing behind.

use polysite_core::{PageEntry, RenderError, SiteRenderer, WebsiteModel};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Safe root {path:?} is not usable: {source}")]
    SafeRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Refusing to write to {destination:?}: not inside {safe_root:?}")]
    Unsafe {
        destination: PathBuf,
        safe_root: PathBuf,
    },

    #[error("Refusing to write to {destination:?}: it overlaps the content root {content_root:?}")]
    OverlapsContent {
        destination: PathBuf,
        content_root: PathBuf,
    },

    #[error("Failed to resolve destination {path:?}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {from:?} to {to:?}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub destination: PathBuf,
    pub pages: usize,
    pub files_copied: usize,
}

/// Resolve `destination` and check it lies strictly below `safe_root`.
///
/// Symlinks are followed on the longest existing ancestor, so a link inside
/// the safe root that points elsewhere is caught. `..` is rejected outright.
pub fn resolve_destination(destination: &Path, safe_root: &Path) -> Result<PathBuf, ExportError> {
    let root = fs::canonicalize(safe_root).map_err(|source| ExportError::SafeRoot {
        path: safe_root.to_path_buf(),
        source,
    })?;
    let unsafe_destination = || ExportError::Unsafe {
        destination: destination.to_path_buf(),
        safe_root: root.clone(),
    };

    if destination
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(unsafe_destination());
    }

    let absolute = if destination.is_absolute() {
        destination.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| ExportError::Resolve {
                path: destination.to_path_buf(),
                source,
            })?
            .join(destination)
    };

    // Canonicalize the deepest existing ancestor, then re-append the rest
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    let resolved = loop {
        match fs::canonicalize(existing) {
            Ok(path) => break path,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                match (existing.file_name(), existing.parent()) {
                    (Some(name), Some(parent)) => {
                        missing.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Err(unsafe_destination()),
                }
            }
            Err(source) => {
                return Err(ExportError::Resolve {
                    path: existing.to_path_buf(),
                    source,
                })
            }
        }
    };
    let resolved = missing
        .iter()
        .rev()
        .fold(resolved, |path, name| path.join(name));

    if resolved == root || !resolved.starts_with(&root) {
        return Err(unsafe_destination());
    }
    Ok(resolved)
}

/// Refuse a destination that is, contains, or lies inside the content root.
fn check_content_overlap(destination: &Path, content_root: &Path) -> Result<(), ExportError> {
    let content = fs::canonicalize(content_root).map_err(|source| ExportError::Resolve {
        path: content_root.to_path_buf(),
        source,
    })?;
    if destination.starts_with(&content) || content.starts_with(destination) {
        return Err(ExportError::OverlapsContent {
            destination: destination.to_path_buf(),
            content_root: content,
        });
    }
    Ok(())
}

/// Remove whatever is at `path` and leave an empty directory.
fn reset_dir(path: &Path) -> Result<(), ExportError> {
    let write_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).map_err(write_err)?,
        Ok(_) => fs::remove_file(path).map_err(write_err)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(write_err(err)),
    }
    fs::create_dir_all(path).map_err(write_err)
}

fn create_parent(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ExportError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Copy a file or directory tree, dereferencing symlinks. Returns files copied.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize, ExportError> {
    let mut copied = 0;
    for entry in WalkDir::new(from).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| ExportError::Walk {
            path: from.to_path_buf(),
            source,
        })?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = if relative.as_os_str().is_empty() {
            to.to_path_buf()
        } else {
            to.join(relative)
        };

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| ExportError::Write {
                path: target.clone(),
                source,
            })?;
        } else {
            create_parent(&target)?;
            fs::copy(entry.path(), &target).map_err(|source| ExportError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Renderer that writes the model into a checked destination directory.
#[derive(Debug)]
pub struct FileRenderer {
    destination: PathBuf,
    pages: usize,
    files_copied: usize,
}

impl FileRenderer {
    /// Check `destination` against `safe_root` and `content_root`, then clear it.
    pub fn new(
        destination: &Path,
        safe_root: &Path,
        content_root: &Path,
    ) -> Result<Self, ExportError> {
        let destination = resolve_destination(destination, safe_root)?;
        check_content_overlap(&destination, content_root)?;
        reset_dir(&destination)?;
        Ok(Self {
            destination,
            pages: 0,
            files_copied: 0,
        })
    }

    fn destination(&self) -> &Path {
        &self.destination
    }

    fn summary(&self) -> ExportSummary {
        ExportSummary {
            destination: self.destination.clone(),
            pages: self.pages,
            files_copied: self.files_copied,
        }
    }
}

impl SiteRenderer for FileRenderer {
    type Error = ExportError;

    fn passthrough(&mut self, name: &str, source: &Path) -> Result<(), ExportError> {
        let copied = copy_tree(source, &self.destination.join(name))?;
        tracing::debug!("Copied {} ({} files)", name, copied);
        self.files_copied += copied;
        Ok(())
    }

    fn page(&mut self, route: &str, entry: &Arc<PageEntry>) -> Result<(), ExportError> {
        let target = self.destination.join(route);
        create_parent(&target)?;
        let html = entry.render()?;
        fs::write(&target, html).map_err(|source| ExportError::Write {
            path: target.clone(),
            source,
        })?;
        tracing::debug!("Rendered: {}", route);
        self.pages += 1;
        Ok(())
    }
}

/// Export `model` to `destination`, which must lie below `safe_root`.
pub fn export_site(
    model: &WebsiteModel,
    destination: &Path,
    safe_root: &Path,
) -> Result<ExportSummary, ExportError> {
    let mut renderer = FileRenderer::new(destination, safe_root, model.content_root())?;

    if let Err(err) = model.render_with(&mut renderer) {
        tracing::error!("Export failed, removing {:?}", renderer.destination());
        if let Err(cleanup) = fs::remove_dir_all(renderer.destination()) {
            tracing::warn!(
                "Failed to remove partial export {:?}: {}",
                renderer.destination(),
                cleanup
            );
        }
        return Err(err);
    }

    let summary = renderer.summary();
    tracing::info!(
        "Exported {} pages and {} files to {:?}",
        summary.pages,
        summary.files_copied,
        summary.destination
    );
    Ok(summary)
}
