//! # polysite CLI
//!
//! Command-line interface for building, serving and exporting polysite sites.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "polysite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "polysite.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the website and export it as static files
    Build {
        /// Output directory (defaults to paths.output)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Serve the website, rendering pages per request
    Serve {
        /// Server port (defaults to server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Serve an exported directory as plain files
    Preview {
        /// Directory to serve (defaults to paths.output)
        dir: Option<PathBuf>,

        /// Server port
        #[arg(long)]
        port: Option<u16>,
    },

    /// List every page route with its matched fragment
    Routes {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `routes` output stays machine-readable
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build { output } => commands::build_site(&cli.config, output.as_deref()),
        Commands::Serve { port } => commands::serve_site(&cli.config, port).await,
        Commands::Preview { dir, port } => {
            commands::preview_dir(&cli.config, dir.as_deref(), port).await
        }
        Commands::Routes { json } => commands::list_routes(&cli.config, json),
    }
}
