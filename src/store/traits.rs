use crate::models::{Listing, ListingDetail};
use crate::store::types::{ListingChanges, ListingFilter, SortOrder};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for listings
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn find(&self, filter: &ListingFilter, order: SortOrder) -> Result<Vec<Listing>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>>;

    /// Listing with owner and review authors expanded
    async fn find_detail(&self, id: Uuid) -> Result<Option<ListingDetail>>;

    /// Insert or replace; a replaced listing keeps its insertion position
    async fn save(&self, listing: &Listing) -> Result<()>;

    /// Merge `changes` into an existing listing, returning the updated record
    async fn update(&self, id: Uuid, changes: &ListingChanges) -> Result<Option<Listing>>;

    /// Remove a listing and its reviews, returning what was removed
    async fn delete(&self, id: Uuid) -> Result<Option<Listing>>;
}
