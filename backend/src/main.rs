//! Task App Backend
//!
//! HTTP server for account signup, login and token refresh.
//!
//! Startup loads configuration, refuses unsafe production settings,
//! connects to PostgreSQL, applies migrations and serves the router until
//! Ctrl+C or SIGTERM.

use anyhow::Result;
use std::sync::Arc;
use task_app_backend::{
    config::AppConfig, db, repositories::PgCredentialStore, routes, state::AppState,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if AppConfig::is_production() { "production" } else { "development" },
        "Starting Task App backend"
    );

    if AppConfig::is_production() {
        let issues = config.production_issues();
        if !issues.is_empty() {
            for issue in &issues {
                error!("Configuration error: {}", issue);
            }
            anyhow::bail!("Invalid production configuration");
        }
        if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
            warn!("Database URL points at localhost - ensure this is intentional for production");
        }
    }

    info!("Connecting to database...");
    let pool = db::create_pool(&config.database).await?;

    // Production deployments run migrations as a separate job
    if !AppConfig::is_production() {
        info!("Running database migrations...");
        db::run_migrations(&pool).await?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(Arc::new(PgCredentialStore::new(pool)), config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if AppConfig::is_production() {
            "task_app_backend=info,tower_http=info".into()
        } else {
            "task_app_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if AppConfig::is_production() {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
