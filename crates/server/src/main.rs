//! Compute node binary.

use std::net::SocketAddr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use compute_server::{ComputeServer, ServerConfig, TaskRegistry};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "computer")]
#[command(about = "Compute node - executes tasks submitted by remote clients", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the compute node
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// Name the node answers lookups under
        #[arg(long)]
        service: Option<String>,
    },

    /// List task kinds this node can execute
    Tasks,

    /// Print server info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let registry = TaskRegistry::with_builtin_tasks();
    let mut config = ServerConfig::default();

    match cli.command {
        Commands::Serve { bind, service } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(service) = service {
                config.service_name = service;
            }

            let server = ComputeServer::bind(config, registry).await?;
            server.serve().await?;
            info!("Shutting down");
        }

        Commands::Tasks => {
            let kinds = registry.kinds();
            println!("Task kinds ({}):", kinds.len());
            for kind in kinds {
                println!("  - {}", kind);
            }
        }

        Commands::Info => {
            println!("Compute node v{}", config.version);
            println!("Service: {}", config.service_name);
            println!("Default address: {}", config.bind_addr);
            println!("Transport: TCP, newline-delimited JSON");
            println!("Tasks: {}", registry.kinds().len());
        }
    }

    Ok(())
}
