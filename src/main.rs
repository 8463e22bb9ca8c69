//! modelgate - local AI orchestrator gateway

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use modelgate::config::ConfigPaths;
use modelgate::Gateway;

/// Local AI orchestrator gateway
#[derive(Debug, Parser)]
#[command(name = "gateway", version, about)]
struct Args {
    /// Main configuration file
    #[arg(long, default_value = "config.yaml", env = "MODELGATE_CONFIG")]
    config: PathBuf,

    /// Routes file
    #[arg(long, default_value = "routes.yaml", env = "MODELGATE_ROUTES")]
    routes: PathBuf,

    /// Per-model scoring file
    #[arg(long, default_value = "models.yaml", env = "MODELGATE_MODELS")]
    models: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let paths = ConfigPaths {
        config: args.config,
        routes: args.routes,
        models: args.models,
    };

    let gateway = match Gateway::new(paths).await {
        Ok(gateway) => gateway,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match gateway.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
