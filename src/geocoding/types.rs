use crate::models::Geometry;
use serde::Deserialize;

/// Forward geocoding response (GeoJSON feature collection)
#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub place_name: Option<String>,
    pub geometry: Geometry,
}
