use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use dive_router::init::init_router;
use dive_router::utils::init_logger;

#[derive(Parser)]
#[command(name = "dive-router", about = "Distance vector router simulator")]
struct Cli {
    /// JSON topology file
    topology: PathBuf,

    /// Id of this router in the topology
    router_id: String,

    /// Router update interval in seconds (default: 5)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Print additional debug information
    #[arg(short, long)]
    verbose: bool,

    /// Optional TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let router = match init_router(&cli.topology, &cli.router_id, cli.config.as_deref(), cli.interval) {
        Ok(router) => Arc::new(router),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    tokio::select! {
        res = router.run() => {
            if let Err(e) = res {
                error!("Router stopped: {}", e);
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            info!("Bye!");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
