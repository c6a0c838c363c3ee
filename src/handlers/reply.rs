use crate::models::{Listing, ListingDetail};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(FlashKind::Success),
            "error" => Some(FlashKind::Error),
            _ => None,
        }
    }
}

/// User-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// View to render and its data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Page {
    Index { listings: Vec<Listing> },
    New,
    Show { listing: ListingDetail },
    Edit { listing: Listing, image_url: String },
}

impl Page {
    pub fn view(&self) -> &'static str {
        match self {
            Page::Index { .. } => "listings/index",
            Page::New => "listings/new",
            Page::Show { .. } => "listings/show",
            Page::Edit { .. } => "listings/edit",
        }
    }
}

/// Outcome of a listing handler
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Render a page; `notice` only lives for this response
    Render { page: Page, notice: Option<Flash> },
    /// Redirect, carrying `flash` over to the next rendered page
    Redirect { to: String, flash: Option<Flash> },
}

impl Reply {
    pub fn render(page: Page) -> Self {
        Reply::Render { page, notice: None }
    }

    pub fn render_with(page: Page, notice: Flash) -> Self {
        Reply::Render {
            page,
            notice: Some(notice),
        }
    }

    pub fn redirect(to: impl Into<String>, flash: Flash) -> Self {
        Reply::Redirect {
            to: to.into(),
            flash: Some(flash),
        }
    }
}
