use crate::geocoding::traits::Geocoder;
use crate::geocoding::types::FeatureCollection;
use crate::models::Geometry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Mapbox forward geocoding client
pub struct MapboxGeocoder {
    client: Client,
    access_token: String,
    base_url: String,
}

impl MapboxGeocoder {
    /// Create a client against the public Mapbox API
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom API host
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("housing-listings/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            access_token: access_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, query: &str) -> String {
        format!(
            "{}/geocoding/v5/mapbox.places/{}.json",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn forward(&self, query: &str) -> Result<Option<Geometry>> {
        let url = self.endpoint(query);
        debug!(query = %query, "Forward geocoding");

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", self.access_token.as_str()), ("limit", "1")])
            .send()
            .await
            .context("Failed to reach Mapbox")?;

        if !response.status().is_success() {
            warn!("Mapbox returned status: {}", response.status());
            anyhow::bail!("Mapbox geocoding failed: {}", response.status());
        }

        let body: FeatureCollection = response
            .json()
            .await
            .context("Failed to parse Mapbox response")?;

        Ok(body.features.into_iter().next().map(|feature| {
            if let Some(name) = &feature.place_name {
                debug!(query = %query, place = %name, "Geocoded");
            }
            feature.geometry
        }))
    }

    fn provider_name(&self) -> &'static str {
        "Mapbox"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_query_as_path_segment() {
        let geocoder = MapboxGeocoder::with_base_url("token", "http://localhost:9000/").unwrap();
        assert_eq!(
            geocoder.endpoint("Goa,India"),
            "http://localhost:9000/geocoding/v5/mapbox.places/Goa%2CIndia.json"
        );
        assert_eq!(
            geocoder.endpoint("New York"),
            "http://localhost:9000/geocoding/v5/mapbox.places/New%20York.json"
        );
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_error() {
        // Nothing listens on port 9 locally
        let geocoder = MapboxGeocoder::with_base_url("token", "http://127.0.0.1:9").unwrap();
        assert!(geocoder.forward("Goa").await.is_err());
    }
}
