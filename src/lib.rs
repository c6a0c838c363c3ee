pub mod config;
pub mod error;
pub mod geocoding;
pub mod handlers;
pub mod images;
pub mod models;
pub mod search;
pub mod store;
pub mod web;

pub use config::Config;
