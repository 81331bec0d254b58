//! CLI command implementations.

pub mod build;
pub mod preview;
pub mod routes;
pub mod serve;

pub use build::build_site;
pub use preview::preview_dir;
pub use routes::list_routes;
pub use serve::serve_site;

use anyhow::{Context, Result};
use polysite_core::{Config, SiteBuilder, WebsiteModel};
use std::path::Path;

/// Load polysite.yml and build the website model it describes.
pub(crate) fn load_model(config_path: &Path) -> Result<(Config, WebsiteModel)> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let model = SiteBuilder::from_config(&config)
        .context("Failed to configure site builder")?
        .build()
        .context("Failed to build site")?;
    Ok((config, model))
}

/// Bind `interface:port` and serve `app` until interrupted.
pub(crate) async fn listen(interface: &str, port: u16, app: axum::Router) -> Result<()> {
    let addr = format!("{}:{}", interface, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Serving at http://{}", addr);
    println!("\nServing at http://{}", addr);
    println!("   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
