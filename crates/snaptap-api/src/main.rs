//! Axum API server binary.

use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use snaptap_api::{create_router, AppConfig, AppState, CleanupJanitor};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("snaptap=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting snaptap-api");

    // Load configuration
    let config = AppConfig::from_env();
    info!(
        "API config: host={}, port={}, data_dir={}",
        config.host,
        config.port,
        config.data_dir.display()
    );

    if let Err(e) = tokio::fs::create_dir_all(&config.data_dir).await {
        eprintln!("Failed to create data dir {}: {}", config.data_dir.display(), e);
        std::process::exit(1);
    }

    // yt-dlp is required at runtime; warn early rather than on first job
    if let Err(e) = snaptap_media::check_ytdlp() {
        warn!("{} - downloads will fail until it is installed", e);
    }

    let state = match AppState::new(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to initialize downloader: {}", e);
            std::process::exit(1);
        }
    };

    // Start cleanup janitor background task
    let janitor = CleanupJanitor::new(
        state.store.clone(),
        config.job_ttl,
        config.cleanup_interval,
    );
    tokio::spawn(async move {
        janitor.run().await;
    });

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
