use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use axum::{routing::get, Router};
use clap::Parser;

use way::config::{load_config, WayConfig};
use way::observability::logging;
use way::transport::http::health_check;
use way::{App, HttpServer};

#[derive(Parser)]
#[command(name = "way")]
#[command(about = "Run services under the way lifecycle supervisor", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => WayConfig::default(),
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        bind_address = %config.http.bind_address,
        request_timeout_secs = config.http.request_timeout_secs,
        "Configuration loaded"
    );

    let router = Router::new().route("/health", get(health_check));
    let http = Arc::new(HttpServer::builder().config(&config.http).router(router).build());

    let app = App::builder()
        .name(config.app.name.clone())
        .version(config.app.version.clone())
        .signals(config.app.signals.iter().copied())
        .server(http)
        .build();

    match app.run().await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Exiting after failure");
            ExitCode::FAILURE
        }
    }
}
