//! mediasort - Sorts TV series and movie files into a canonical directory tree.
//!
//! Usage:
//!   mediasort [OPTIONS] <TARGETS>...     Sort once
//!   mediasort -r -w <DIR>                Sort, then keep watching
//!   mediasort --help                     Show help

mod cli;

use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mediasort_engine::{FilenameResolver, Sorter, TemplateFormatter};

use crate::cli::{Cli, FileConfig};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.log_level());

    let file = FileConfig::load(cli.config.as_deref())?;
    let config = cli.into_config(file)?;

    let formatter = Arc::new(TemplateFormatter::new(config.path_config.clone()));
    let sorter = Sorter::new(config, Arc::new(FilenameResolver::new()), formatter)?;

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("Interrupted, finishing up (press Ctrl-C again to abort)");
        shutdown.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Aborted");
            std::process::exit(130);
        }
    });

    let stats = sorter.run_until(&token).await?;
    info!(
        found = stats.found,
        matched = stats.matched,
        moved = stats.moved,
        "done"
    );

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the verbosity flags.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
