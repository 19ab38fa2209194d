//! Rota ML - HTTP API for delivery routes and expenses

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rota_ml::cli::{Cli, Command};
use rota_ml::config::{mask_credentials, Config, StoreBackend, StoreConfig};
use rota_ml::db::{open_store, StoreHandle};
use rota_ml::handlers::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.logs_dir, "rota-ml.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,rota_ml=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await,
        Command::InitDb {
            database_url,
            database_name,
        } => init_db(config, database_url, database_name).await,
        Command::CheckConfig => {
            check_config(&config);
            Ok(())
        }
    }
}

async fn serve(config: Config, port: Option<u16>) -> Result<()> {
    info!("Starting Rota ML API...");

    let store_config = config.store();
    match &store_config {
        Some(store) => info!(
            "Store: {} at {} (db {})",
            store.backend,
            mask_credentials(&store.url),
            store.database_name
        ),
        None => warn!("No DATABASE_URL set; data endpoints will answer 'db not configured'"),
    }

    let state = AppState::new(StoreHandle::new(store_config), config.avulso_unit);

    // Open the store and set up schema early; requests retry if this fails
    if state.store.is_configured() {
        if let Err(e) = state.store.get().await {
            warn!("Store not ready at startup: {}", e);
        }
    }

    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.port)));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn init_db(
    config: Config,
    database_url: Option<String>,
    database_name: Option<String>,
) -> Result<()> {
    let result = prepare_schema(config, database_url, database_name).await;

    match result {
        Ok(db) => {
            info!("Schema ready on {}", db);
            println!("ok:{}", db);
            Ok(())
        }
        Err(e) => {
            error!("init-db failed: {:#}", e);
            println!("error:{:#}", e);
            Err(e)
        }
    }
}

/// Open the configured store and create its schema; returns the database name
async fn prepare_schema(
    config: Config,
    database_url: Option<String>,
    database_name: Option<String>,
) -> Result<String> {
    let (url, backend) = match database_url {
        Some(url) => {
            let backend = StoreBackend::infer(&url).or(config.backend);
            (url, backend)
        }
        None => match config.database_url {
            Some(url) => (url, config.backend),
            None => anyhow::bail!("missing DATABASE_URL"),
        },
    };
    let backend = backend.with_context(|| {
        format!("cannot infer store backend from '{}'", mask_credentials(&url))
    })?;

    let store_config = StoreConfig {
        url,
        database_name: database_name.unwrap_or(config.database_name),
        backend,
    };
    let store = open_store(&store_config).await?;
    store.ensure_schema().await?;
    Ok(store.database_name().to_string())
}

fn check_config(config: &Config) {
    println!(
        "DATABASE_URL  = {}",
        config
            .database_url
            .as_deref()
            .map(mask_credentials)
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("DATABASE_NAME = {}", config.database_name);
    println!(
        "STORE_BACKEND = {}",
        config.backend.map(|b| b.as_str()).unwrap_or("(none)")
    );
    println!("AVULSO_UNIT   = {}", config.avulso_unit);
    println!("PORT          = {}", config.port);
    println!("LOGS_DIR      = {}", config.logs_dir);
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
