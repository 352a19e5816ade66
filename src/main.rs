use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use geotrace::api::{self, PageTemplate};
use geotrace::config::Config;
use geotrace::lookup::LookupService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("geotrace=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // The page shell is resolved once; a broken build fails here, not per request
    let template = PageTemplate::load().context("failed to load lookup page template")?;

    let service = LookupService::from_config(&config)?;
    info!(
        provider = %config.provider.base_url,
        retries = config.retry.total,
        backoff_factor = config.retry.backoff_factor,
        workers = config.lookup.workers,
        "Geolocation lookups configured"
    );

    let router = api::create_router(service, template);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Lookup server listening on http://{}", addr);
    info!("   - Lookup form available at http://{}/", addr);
    info!("   - JSON endpoint available at http://{}/api/lookup", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
