use anyhow::{Context, Result};
use housing_listings::geocoding::{DisabledGeocoder, Geocoder, MapboxGeocoder};
use housing_listings::handlers::ListingHandlers;
use housing_listings::store::SqliteListingStore;
use housing_listings::web::build_app;
use housing_listings::Config;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,housing_listings=debug,tower_http=debug".into()),
        )
        .init();

    info!("🏠 Housing Listings");
    info!("==================");

    let config = Config::from_env().context("Failed to load configuration")?;

    // Open the listing database
    let store = SqliteListingStore::open(&config.database_path)?;
    store.create_schema().await?;
    info!("💾 Using database at {}", config.database_path);

    let geocoder: Arc<dyn Geocoder> = match &config.map_token {
        Some(token) => Arc::new(MapboxGeocoder::with_base_url(
            token.clone(),
            config.mapbox_base_url.clone(),
        )?),
        None => {
            warn!("MAP_TOKEN is not set, every listing gets the default coordinates");
            Arc::new(DisabledGeocoder)
        }
    };
    info!("Geocoding via {}", geocoder.provider_name());

    let app = build_app(ListingHandlers::new(Arc::new(store), geocoder));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
