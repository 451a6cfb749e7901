use api_health_checker::db;
use api_health_checker::monitoring::{CheckWriter, MonitorScheduler};
use api_health_checker::server::config::ServerConfig;
use api_health_checker::version::VERSION;
use api_health_checker::web;

use axum::{ServiceExt, extract::Request};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Queued probe results before probe tasks start waiting on the writer.
const CHECK_QUEUE_CAPACITY: usize = 1024;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str, debug: bool) {
    // JSON to a daily rotated file, human-readable to stdout.
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let default_filter = if debug {
        "debug,sea_orm=info,sqlx::query=warn"
    } else {
        "info,sea_orm=warn,sqlx::query=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("Server version: {VERSION}");
        return Ok(());
    }

    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            // Logging is not up yet, the log directory comes from the config.
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir, server_config.api_debug);
    info!("Starting server, version: {}", VERSION);

    let db_pool = match db::connect_and_migrate(&server_config.database_url(), 10).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to prepare the database.");
            return Err(e.into());
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let mut background_tasks = Vec::new();

    if server_config.scheduler_enabled {
        let (results_tx, writer) = CheckWriter::channel(db_pool.clone(), CHECK_QUEUE_CAPACITY);
        let scheduler = MonitorScheduler::new(db_pool.clone(), results_tx, &server_config)?;
        background_tasks.push(tokio::spawn(writer.run()));
        background_tasks.push(tokio::spawn(scheduler.run(shutdown_rx)));
    } else {
        info!("Monitor scheduler disabled by configuration.");
    }

    let app = web::create_axum_router(db_pool, server_config.clone());

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr).await?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for the shutdown signal.");
        }
        info!("Shutdown signal received.");
    })
    .await?;

    // Stopping the scheduler drops the last sender, which lets the writer drain and exit.
    shutdown_tx.send(()).ok();
    for task in background_tasks {
        if let Err(e) = task.await {
            error!(error = %e, "Background task ended abnormally.");
        }
    }

    info!("Server stopped.");
    Ok(())
}
