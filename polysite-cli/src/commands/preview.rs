//! Static preview of an exported site.

use super::listen;
use anyhow::{bail, Context, Result};
use polysite_core::{config::ServerConfig, Config};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Serve `dir` as plain files. Without a directory, `paths.output` is used.
///
/// An explicit directory can be previewed without any polysite.yml.
pub async fn preview_dir(config_path: &Path, dir: Option<&Path>, port: Option<u16>) -> Result<()> {
    let (root, server) = match dir {
        Some(dir) if !config_path.exists() => (dir.to_path_buf(), ServerConfig::default()),
        _ => {
            let config = Config::from_file(config_path).context("Failed to load configuration")?;
            let root = dir.map_or_else(|| config.output_dir(), Path::to_path_buf);
            (root, config.server)
        }
    };
    if !root.is_dir() {
        bail!("Nothing to preview: {:?} is not a directory", root);
    }

    let app = axum::Router::new()
        .fallback_service(ServeDir::new(&root))
        .layer(TraceLayer::new_for_http());

    tracing::info!("Previewing {:?}", root);
    listen(&server.interface, port.unwrap_or(server.port), app).await
}
