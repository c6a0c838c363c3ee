use crate::error::AppError;
use crate::geocoding::{locate, Geocoder};
use crate::handlers::reply::{Flash, Page, Reply};
use crate::images::ImageTransform;
use crate::models::{Image, Listing, ListingSubmission};
use crate::search::{normalize_query, search_plan};
use crate::store::{ListingChanges, ListingFilter, ListingStore, SortOrder};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const INDEX: &str = "/listings";

/// Request handlers for listings, one method per route
#[derive(Clone)]
pub struct ListingHandlers {
    store: Arc<dyn ListingStore>,
    geocoder: Arc<dyn Geocoder>,
    preview: ImageTransform,
}

impl ListingHandlers {
    pub fn new(store: Arc<dyn ListingStore>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            store,
            geocoder,
            preview: ImageTransform::EDIT_PREVIEW,
        }
    }

    pub async fn index(&self) -> Result<Reply, AppError> {
        let listings = self
            .store
            .find(&ListingFilter::All, SortOrder::Insertion)
            .await?;
        Ok(Reply::render(Page::Index { listings }))
    }

    pub fn new_form(&self) -> Reply {
        Reply::render(Page::New)
    }

    pub async fn show(&self, id: &str) -> Result<Reply, AppError> {
        let detail = match parse_id(id) {
            Some(id) => self.store.find_detail(id).await?,
            None => None,
        };

        Ok(match detail {
            Some(listing) => Reply::render(Page::Show { listing }),
            None => Reply::redirect(INDEX, Flash::error("Listing you requested for does not exist!")),
        })
    }

    pub async fn create(&self, owner: Uuid, submission: ListingSubmission) -> Result<Reply, AppError> {
        let ListingSubmission { listing: form, file } = submission;
        let image: Image = file.ok_or(AppError::MissingImage)?.into();

        let geometry = locate(self.geocoder.as_ref(), &form.location).await;
        let listing = Listing::from_form(form, owner, image, geometry);
        self.store.save(&listing).await?;

        info!(listing_id = %listing.id, owner = %owner, "🏠 Listing created");
        Ok(Reply::redirect(INDEX, Flash::success("New listing created!")))
    }

    pub async fn edit_form(&self, id: &str) -> Result<Reply, AppError> {
        let listing = match parse_id(id) {
            Some(id) => self.store.find_by_id(id).await?,
            None => None,
        };

        Ok(match listing {
            Some(listing) => {
                let image_url = self.preview.apply(&listing.image.url);
                Reply::render(Page::Edit { listing, image_url })
            }
            None => edit_missing(),
        })
    }

    pub async fn update(&self, id: &str, submission: ListingSubmission) -> Result<Reply, AppError> {
        let Some(listing_id) = parse_id(id) else {
            return Ok(edit_missing());
        };
        let ListingSubmission { listing: form, file } = submission;

        let query = format!("{},{}", form.location, form.country);
        let geometry = locate(self.geocoder.as_ref(), &query).await;
        let changes = ListingChanges::from_form(form, geometry);

        let Some(mut listing) = self.store.update(listing_id, &changes).await? else {
            return Ok(edit_missing());
        };
        if let Some(file) = file {
            listing.image = file.into();
            self.store.save(&listing).await?;
            debug!(listing_id = %listing_id, "Listing image replaced");
        }

        info!(listing_id = %listing_id, "Listing updated");
        Ok(Reply::redirect(
            format!("{}/{}", INDEX, listing_id),
            Flash::success("Listing updated!"),
        ))
    }

    /// Listings tagged with `tag`
    pub async fn filter(&self, tag: &str) -> Result<Reply, AppError> {
        let listings = self
            .store
            .find(&ListingFilter::HasCategory(tag.to_string()), SortOrder::Insertion)
            .await?;

        if listings.is_empty() {
            return Ok(Reply::redirect(
                INDEX,
                Flash::error(format!("There are no listings for {}!", tag)),
            ));
        }
        Ok(Reply::render_with(
            Page::Index { listings },
            Flash::success(format!("Listings filtered by {}!", tag)),
        ))
    }

    pub async fn search(&self, query: Option<&str>) -> Result<Reply, AppError> {
        let Some(term) = query.and_then(normalize_query) else {
            return Ok(Reply::redirect(INDEX, Flash::error("Please enter a search query!")));
        };

        for step in search_plan(&term) {
            let listings = self.store.find(&step.filter, step.order).await?;
            if !listings.is_empty() {
                debug!(term = %term, filter = ?step.filter, count = listings.len(), "Search matched");
                return Ok(Reply::render_with(
                    Page::Index { listings },
                    Flash::success(step.notice),
                ));
            }
        }

        debug!(term = %term, "Search found nothing");
        Ok(Reply::redirect(INDEX, Flash::error("No listings found based on your search!")))
    }

    pub async fn destroy(&self, id: &str) -> Result<Reply, AppError> {
        if let Some(id) = parse_id(id) {
            if let Some(removed) = self.store.delete(id).await? {
                info!(listing_id = %removed.id, "Listing deleted");
            }
        }
        Ok(Reply::redirect(INDEX, Flash::success("Listing deleted!")))
    }

    /// Reservations are not stored yet, the guest only gets a confirmation
    pub fn reserve(&self, id: &str) -> Reply {
        Reply::redirect(
            format!("{}/{}", INDEX, id),
            Flash::success("Reservation details sent to your email!"),
        )
    }
}

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

fn edit_missing() -> Reply {
    Reply::redirect(INDEX, Flash::error("Listing you are trying to edit does not exist!"))
}
