use anyhow::{Context, Result};
use property_valuation::api::{router, AppState};
use property_valuation::config::AppConfig;
use property_valuation::ingestion::CsvSaleSource;
use property_valuation::valuation::{ValuationConfig, ValuationEngine};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .init();

    info!("Starting valuation API server...");

    // Optional default sale-record source
    let source = match &config.sales_csv {
        Some(path) => {
            let source = CsvSaleSource::from_path(path)
                .with_context(|| format!("failed to load sale records from {:?}", path))?;
            info!("Loaded {} sale records from {:?}", source.len(), path);
            Some(Arc::new(source))
        }
        None => {
            info!("No SALES_CSV configured; requests must carry their own sales");
            None
        }
    };

    let engine = ValuationEngine::new(
        ValuationConfig::default().with_location_free_matching(config.allow_location_free),
    );

    let state = AppState {
        engine: Arc::new(engine),
        source,
    };

    let addr = config.server.socket_addr()?;
    info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
