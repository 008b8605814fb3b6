//! Arachne CLI.
//!
//! Usage:
//!     arachne singlenode --workers 4 --output-dir ./output
//!     arachne client

use anyhow::Result;
use arachne::demo;
use arachne::runtime::{run_single_node, SingleNodeOptions};
use arachne_logging::{init_logging, LogConfig};
use arachne_protocol::{defaults, BusConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "arachne", about = "Distributed web scraping engine")]
struct Cli {
    /// Widen the fallback log filter to debug
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run manager, workers, and exporter in one process on the in-memory bus
    Singlenode {
        /// Number of worker loops
        #[arg(long, default_value_t = 1)]
        workers: usize,

        /// Directory for exported item files
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Adapter poll interval in milliseconds
        #[arg(long, default_value_t = defaults::DEFAULT_POLL_INTERVAL_MS)]
        poll_interval_ms: u64,

        /// How long the bus must stay empty before the job counts as done
        #[arg(long, default_value_t = defaults::DEFAULT_IDLE_GRACE_MS)]
        idle_grace_ms: u64,
    },
    /// REST client (reserved)
    Client,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogConfig {
        app_name: "arachne",
        verbose: cli.verbose,
    })?;

    info!("starting arachne instance");

    match cli.command {
        Some(Command::Singlenode {
            workers,
            output_dir,
            poll_interval_ms,
            idle_grace_ms,
        }) => {
            info!(workers, "running single-node instance");
            let options = SingleNodeOptions {
                workers,
                output_dir,
                bus: BusConfig {
                    poll_interval: Duration::from_millis(poll_interval_ms),
                    idle_grace: Duration::from_millis(idle_grace_ms),
                    ..BusConfig::default()
                },
            };
            run_demo(options).await?;
        }
        Some(Command::Client) => {
            // TODO: client for the future REST API.
            println!("client part not implemented yet");
        }
        None => {
            run_demo(SingleNodeOptions::default()).await?;
        }
    }

    Ok(())
}

async fn run_demo(options: SingleNodeOptions) -> Result<()> {
    let workflow = demo::demo_workflow(demo::DEFAULT_BASE_URL);
    let summary = run_single_node(workflow, options).await?;
    info!(
        job = %summary.job_uuid,
        csv = %summary.items_csv.display(),
        "job finished"
    );
    Ok(())
}
