//! Application entry point and server initialization.
//!
//! Loads environment configuration, initializes the database and the
//! media host client, and starts the HTTP server with graceful shutdown
//! support.

use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use academy_api::config::Config;
use academy_api::database::{init_db, AppState};
use academy_api::media::{HttpMediaHost, MediaHost, MemoryMediaHost};
use academy_api::route::create_app;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "academy_api=debug,tower_http=debug".to_string()),
        )
        .init();

    let config = Config::from_env();
    let port = config.port;
    let db_name = config.database_path.clone();

    let db = init_db(&config.database_path).expect("Failed to initialize database");

    // Without media credentials, uploads stay in memory (local development).
    let media: Arc<dyn MediaHost> = if config.media_api_key.is_empty() {
        tracing::warn!("no media host credentials configured, storing uploads in memory");
        Arc::new(MemoryMediaHost::new())
    } else {
        Arc::new(
            HttpMediaHost::new(
                &config.media_base_url,
                &config.media_api_key,
                &config.media_api_secret,
                config.upload_timeout,
            )
            .expect("Failed to build media host client"),
        )
    };

    let state = AppState {
        db: Arc::new(db),
        media,
        config: Arc::new(config),
    };

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await.unwrap();

    println!("🚀 Server running at http://localhost:{}", port);
    println!("📂 Using database: {}", db_name);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

/// Resolves when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received so the
/// server can drain open connections before exiting.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    println!("\n🛑 Shutdown signal received, stopping server.");
}
