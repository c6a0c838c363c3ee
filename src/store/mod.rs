pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteListingStore;
pub use traits::ListingStore;
pub use types::{ListingChanges, ListingFilter, SortOrder, TextField};
