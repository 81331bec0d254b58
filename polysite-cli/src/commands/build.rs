//! Build command implementation.

use super::load_model;
use anyhow::{Context, Result};
use polysite_render::export_site;
use std::path::Path;

/// Build the model and export it to `output`, or to `paths.output`.
pub fn build_site(config_path: &Path, output: Option<&Path>) -> Result<()> {
    let (config, model) = load_model(config_path)?;

    let destination = output.map_or_else(|| config.output_dir(), Path::to_path_buf);
    let summary = export_site(&model, &destination, &config.safe_root())
        .with_context(|| format!("Failed to export site to {:?}", destination))?;

    println!(
        "Built {} pages and copied {} files to {}",
        summary.pages,
        summary.files_copied,
        summary.destination.display()
    );
    Ok(())
}
