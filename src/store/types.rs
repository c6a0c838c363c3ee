use crate::models::{Geometry, ListingForm};

/// Free-text listing fields that can be searched by substring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Category,
    Country,
    Location,
}

impl TextField {
    pub fn label(self) -> &'static str {
        match self {
            TextField::Title => "Title",
            TextField::Category => "Category",
            TextField::Country => "Country",
            TextField::Location => "Location",
        }
    }
}

/// Which listings a query selects
#[derive(Debug, Clone, PartialEq)]
pub enum ListingFilter {
    All,
    /// Category list contains exactly this tag
    HasCategory(String),
    /// Case-insensitive substring match on a text field
    Contains { field: TextField, needle: String },
    PriceAtMost(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Insertion,
    NewestFirst,
    PriceAscending,
}

/// Field changes applied by an update
#[derive(Debug, Clone)]
pub struct ListingChanges {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub country: String,
    /// Left untouched when `None`
    pub category: Option<Vec<String>>,
    pub geometry: Geometry,
}

impl ListingChanges {
    pub fn from_form(form: ListingForm, geometry: Geometry) -> Self {
        Self {
            title: form.title,
            description: form.description,
            price: form.price,
            location: form.location,
            country: form.country,
            category: form.category,
            geometry,
        }
    }
}
