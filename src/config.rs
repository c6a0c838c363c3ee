use crate::geocoding::mapbox::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Mapbox access token; geocoding is disabled without it
    pub map_token: Option<String>,
    pub mapbox_base_url: String,
    pub database_path: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            map_token: env::var("MAP_TOKEN").ok().filter(|token| !token.trim().is_empty()),
            mapbox_base_url: env::var("MAPBOX_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "listings.db".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
        })
    }
}
