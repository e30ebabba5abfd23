//! CLI entry point for sitegraph

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitegraph::server::ServeOptions;
use sitegraph::Site;

#[derive(Parser)]
#[command(name = "sitegraph")]
#[command(version)]
#[command(about = "Turn a tree of Markdown/MDX documents into a routed static site", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new document
    New {
        /// Title of the new document
        title: String,

        /// Directory under the content base path
        #[arg(long)]
        dir: Option<String>,
    },

    /// Build the site
    #[command(alias = "b")]
    Build {
        /// Rebuild on file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Build, then serve the site locally
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Serve without rebuilding or live reload
        #[arg(long)]
        r#static: bool,
    },

    /// Remove the public folder
    Clean,

    /// List the content graph or the created pages
    List {
        /// What to list (node, page)
        #[arg(default_value = "pages")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "sitegraph=debug,info"
    } else {
        "sitegraph=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    match cli.command {
        Commands::New { title, dir } => {
            let site = Site::new(&base_dir)?;
            site.new_document(&title, dir.as_deref())?;
        }

        Commands::Build { watch } => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Building {:?}...", site.base_dir);
            site.build()?;

            if watch {
                tokio::task::spawn_blocking(move || sitegraph::commands::build::watch(&site))
                    .await??;
            }
        }

        Commands::Serve {
            port,
            ip,
            open,
            r#static,
        } => {
            let site = Site::new(&base_dir)?;
            site.build()?;

            let options = ServeOptions {
                ip,
                port,
                live_reload: !r#static,
                open,
            };
            sitegraph::server::start(&site, &options).await?;
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            site.clean()?;
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            sitegraph::commands::list::run(&site, &r#type)?;
        }

        Commands::Version => {
            println!("sitegraph version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
