use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use city_info_hub::config::Config;
use city_info_hub::routes::{create_router, AppState, AVAILABLE_ENDPOINTS};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "city_info_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    config.warn_missing_keys();

    let port = config.port;
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Cache TTL: {} seconds", config.cache_ttl_secs);

    let state = AppState::new(config)?;

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("City info hub running on http://0.0.0.0:{}", port);
    for endpoint in AVAILABLE_ENDPOINTS {
        tracing::info!("  {}", endpoint);
    }

    axum::serve(listener, app).await?;

    Ok(())
}
