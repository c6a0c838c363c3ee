pub mod listings;
pub mod reply;

pub use listings::ListingHandlers;
pub use reply::{Flash, FlashKind, Page, Reply};
