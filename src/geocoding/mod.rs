pub mod mapbox;
pub mod traits;
pub mod types;

pub use mapbox::MapboxGeocoder;
pub use traits::Geocoder;

use crate::models::Geometry;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, warn};

/// Geocoder used when no access token is configured; never resolves anything
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn forward(&self, _query: &str) -> Result<Option<Geometry>> {
        Ok(None)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Resolve `query` to a point, falling back to the default coordinates.
///
/// Provider failures and empty results are logged and never surfaced.
pub async fn locate(geocoder: &dyn Geocoder, query: &str) -> Geometry {
    match geocoder.forward(query).await {
        Ok(Some(geometry)) => geometry,
        Ok(None) => {
            warn!(query = %query, provider = geocoder.provider_name(), "⚠️ No geocoding result, using default coordinates");
            Geometry::fallback()
        }
        Err(e) => {
            error!(error = %e, query = %query, provider = geocoder.provider_name(), "❌ Geocoding failed, using default coordinates");
            Geometry::fallback()
        }
    }
}
