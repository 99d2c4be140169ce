//! Binary entry point for ssam-node.

use std::path::PathBuf;

use clap::Parser;
use tokio::signal;

use ssam_chain::config::Config;
use ssam_chain::node::Node;

#[derive(Debug, Parser)]
#[command(name = "ssam-node", about = "Sharded Stake Aggregation Model node")]
struct Cli {
    /// Path to the JSON node configuration (spec §6).
    #[arg(long, default_value = "_config/config.json")]
    config: PathBuf,

    /// Directory for the optional local chain snapshot (spec §6
    /// "Persisted state"). Omit to disable persistence entirely.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Address to bind the peer listener on.
    #[arg(long, default_value = "0.0.0.0:5000")]
    listen: String,
}

#[tokio::main]
async fn main() {
    let _ = env_logger::builder().try_init();

    let cli = Cli::parse();

    let node_name = match std::env::var("NODE_NAME") {
        Ok(name) => name,
        Err(_) => {
            log::error!("NODE_NAME environment variable is required");
            std::process::exit(1);
        }
    };

    let shard = match std::env::var("SHARD") {
        Ok(shard) => shard,
        Err(_) => {
            log::error!("SHARD environment variable is required");
            std::process::exit(1);
        }
    };

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("failed to load config {:?}: {}", cli.config, e);
            std::process::exit(1);
        }
    };

    log::info!("starting node '{}' in shard '{}'", node_name, shard);

    let node = Node::new(node_name, shard, config, cli.listen, cli.data_dir);

    tokio::select! {
        result = node.run() => {
            if let Err(e) = result {
                log::error!("node exited with error: {}", e);
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            log::info!("shutdown signal received, exiting");
        }
    }
}
