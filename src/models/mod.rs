use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Longitude/latitude used when a location cannot be geocoded (New Delhi)
pub const FALLBACK_COORDINATES: [f64; 2] = [77.2090, 28.6139];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
}

/// GeoJSON point, coordinates are `[longitude, latitude]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub coordinates: [f64; 2],
}

impl Geometry {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: GeometryKind::Point,
            coordinates: [longitude, latitude],
        }
    }

    pub fn fallback() -> Self {
        Self::point(FALLBACK_COORDINATES[0], FALLBACK_COORDINATES[1])
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

/// Hosted image of a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub filename: String,
    pub url: String,
}

/// Core listing record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Image,
    pub price: i64,
    pub location: String,
    pub country: String,
    pub category: Vec<String>,
    pub geometry: Geometry,
    pub owner: Option<Uuid>,
    pub reviews: Vec<Uuid>,
}

impl Listing {
    /// Build a fresh listing from a submitted form
    pub fn from_form(form: ListingForm, owner: Uuid, image: Image, geometry: Geometry) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: form.title,
            description: form.description,
            image,
            price: form.price,
            location: form.location,
            country: form.country,
            category: form.category.unwrap_or_default(),
            geometry,
            owner: Some(owner),
            reviews: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub comment: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub author: Option<Uuid>,
}

/// Review with its author expanded
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReviewDetail {
    pub id: Uuid,
    pub comment: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub author: Option<User>,
}

/// Listing with owner and reviews expanded, as shown on the detail page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListingDetail {
    pub listing: Listing,
    pub owner: Option<User>,
    pub reviews: Vec<ReviewDetail>,
}

/// Submitted `listing.*` fields
#[derive(Debug, Clone, Deserialize)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub country: String,
    /// `None` when the form carried no category at all
    #[serde(default, deserialize_with = "one_or_many")]
    pub category: Option<Vec<String>>,
}

/// File descriptor handed over by the upload middleware
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub path: String,
}

impl From<UploadedFile> for Image {
    fn from(file: UploadedFile) -> Self {
        Self {
            filename: file.filename,
            url: file.path,
        }
    }
}

/// Body of create and update requests
#[derive(Debug, Clone, Deserialize)]
pub struct ListingSubmission {
    pub listing: ListingForm,
    #[serde(default)]
    pub file: Option<UploadedFile>,
}

// A single checked box arrives as a string, several as a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(tag)) => Some(vec![tag]),
        Some(OneOrMany::Many(tags)) => Some(tags),
        None => None,
    })
}
