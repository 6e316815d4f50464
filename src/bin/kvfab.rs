//! kvfab binary

use clap::{Parser, Subcommand};
use kvfab::{common::init_logging, Application, Config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kvfab")]
#[command(about = "Join a replicated KV store node to its cluster and wait until it is synced")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the node, start the engine and wait for sync
    Start {
        /// Config file (JSON or TOML)
        #[arg(long)]
        config: PathBuf,
    },

    /// Print the engine's --initial-cluster and --initial-cluster-state flags
    InitialCluster {
        /// Config file (JSON or TOML)
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logging = init_logging(cli.log_level.as_deref());

    let path = match &cli.command {
        Commands::Start { config } | Commands::InitialCluster { config } => config.clone(),
    };
    // Both log an `action` event on failure before the error reaches main
    let config = Config::load(&path)?;
    logging.apply_config_level(&config.log_level);
    tracing::info!(
        action = "kvfab.config.loaded",
        path = %path.display(),
        node = %config.node.name,
        index = config.node.index
    );

    let app = Application::from_config(config)?;

    match cli.command {
        Commands::Start { .. } => {
            let report = app.start().await?;
            tracing::info!(
                action = "kvfab.start.done",
                state = %report.initial_cluster.state,
                pid = ?report.pid
            );
        }

        Commands::InitialCluster { .. } => {
            let initial = app.initial_cluster_state().await?;
            println!("--initial-cluster={}", initial.members);
            println!("--initial-cluster-state={}", initial.state);
        }
    }

    Ok(())
}
