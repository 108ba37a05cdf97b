// sitesearch: build a static site's search index, or serve queries over it.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sitesearch::ServiceConfig;

#[derive(Parser)]
#[command(name = "sitesearch", version, about = "Static-site full-text search")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the search store from a JSON document feed
    Build {
        /// JSON export of site documents
        #[arg(long)]
        input: PathBuf,
        /// SQLite store to (re)create
        #[arg(long, default_value = "search.db")]
        db: PathBuf,
    },
    /// Serve the search API over HTTP
    Serve {
        /// SQLite store produced by `build`
        #[arg(long, default_value = "search.db")]
        db: PathBuf,
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
        /// Default (and maximum requestable) page size
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Build { input, db } => {
            let report = sitesearch::build_index(&input, &db).await?;
            tracing::info!(
                indexed = report.indexed,
                skipped = report.skipped,
                "index build finished"
            );
            Ok(())
        }
        Command::Serve { db, bind, per_page } => {
            let cfg = ServiceConfig::new(db).with_results_per_page(per_page);
            sitesearch::server::serve(cfg, bind).await
        }
    }
}
