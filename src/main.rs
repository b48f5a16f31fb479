mod config;
mod digest;
mod routes;
mod store;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, StoreConfig};
use crate::digest::DigestService;
use crate::routes::{AppState, PageCache};
use crate::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daily_brief=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load("brief.toml")?;
    let store_config = StoreConfig::from_env()?;

    // Remote store client
    let store = Arc::new(Store::new(&store_config)?);
    info!("Store client ready for {}", store_config.url);

    // Create app state
    let state = Arc::new(AppState {
        digests: Arc::new(DigestService::new(store)),
        page_cache: PageCache::new(Duration::from_secs(config.page_cache_ttl_secs)),
        archive_limit: config.archive_limit,
    });

    // Build router
    let app = Router::new()
        .route("/", get(routes::index))
        .route("/archive", get(routes::archive))
        .route("/health", get(routes::health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
