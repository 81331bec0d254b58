//! Dynamic server: pages rendered per request from the in-memory model.

use super::{listen, load_model};
use anyhow::{Context, Result};
use polysite_render::router;
use std::path::Path;

pub async fn serve_site(config_path: &Path, port: Option<u16>) -> Result<()> {
    let (config, model) = load_model(config_path)?;
    let app = router(&model).context("Failed to register routes")?;

    tracing::info!(
        "Serving {} pages and {} pass-through entries",
        model.pages().len(),
        model.passthrough().len()
    );
    listen(
        &config.server.interface,
        port.unwrap_or(config.server.port),
        app,
    )
    .await
}
