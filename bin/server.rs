// Insurance Certificates - Web Server

use anyhow::{Context, Result};
use chrono::Utc;
use insurance_certificates::{api, logger, AppConfig, CertificateService, SqliteStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_logger(false);

    let config = AppConfig::load(None)?;
    let zone = config.zone()?;

    let store = match &config.database.path {
        Some(path) => {
            tracing::info!("Database: {:?}", path);
            SqliteStore::open(path)?
        }
        None => {
            tracing::info!("Database: in-memory");
            SqliteStore::open_in_memory()?
        }
    };

    let service = Arc::new(CertificateService::new(store, zone));

    if config.seed_demo_data {
        service.seed_demo_certificates(Utc::now())?;
    }

    let app = api::router(service);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    tracing::info!(
        "Server running on http://{} (issuer time zone {})",
        config.server.bind,
        zone
    );

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
