use crate::models::Geometry;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for forward geocoding providers
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve free text to the first matching point, `None` when nothing matched
    async fn forward(&self, query: &str) -> Result<Option<Geometry>>;

    /// Get the name of the provider
    fn provider_name(&self) -> &'static str;
}
