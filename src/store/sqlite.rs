use crate::models::{Geometry, Image, Listing, ListingDetail, Review, ReviewDetail, User};
use crate::store::traits::ListingStore;
use crate::store::types::{ListingChanges, ListingFilter, SortOrder, TextField};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL,
    email TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS listings (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    image_filename TEXT NOT NULL,
    image_url TEXT NOT NULL,
    price INTEGER NOT NULL,
    location TEXT NOT NULL,
    country TEXT NOT NULL,
    longitude REAL NOT NULL,
    latitude REAL NOT NULL,
    owner_id TEXT
);

CREATE TABLE IF NOT EXISTS listing_categories (
    listing_id TEXT NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    tag TEXT NOT NULL,
    PRIMARY KEY (listing_id, position)
);

CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    listing_id TEXT NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
    comment TEXT NOT NULL,
    rating INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    author_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_listing_categories_tag ON listing_categories(tag);
CREATE INDEX IF NOT EXISTS idx_reviews_listing ON reviews(listing_id);
"#;

const LISTING_COLUMNS: &str = "l.id, l.title, l.description, l.image_filename, l.image_url, \
     l.price, l.location, l.country, l.longitude, l.latitude, l.owner_id";

/// SQLite-backed listing store
pub struct SqliteListingStore {
    conn: Mutex<Connection>,
}

impl SqliteListingStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        register_functions(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    pub async fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(SCHEMA)
            .context("Failed to create schema")?;
        info!("Database schema ready");
        Ok(())
    }

    pub async fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (id, username, email) VALUES (?1, ?2, ?3)",
            params![user.id.to_string(), user.username, user.email],
        )
        .context("Failed to insert user")?;
        Ok(())
    }

    /// Attach a review to an existing listing
    pub async fn insert_review(&self, listing_id: Uuid, review: &Review) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO reviews (id, listing_id, comment, rating, created_at, author_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                review.id.to_string(),
                listing_id.to_string(),
                review.comment,
                review.rating,
                review.created_at,
                review.author.map(|id| id.to_string()),
            ],
        )
        .context("Failed to insert review")?;
        Ok(())
    }
}

#[async_trait]
impl ListingStore for SqliteListingStore {
    async fn find(&self, filter: &ListingFilter, order: SortOrder) -> Result<Vec<Listing>> {
        let conn = self.conn.lock().await;
        let (clause, values) = where_clause(filter);
        let sql = format!(
            "SELECT {} FROM listings l WHERE {} ORDER BY {}",
            LISTING_COLUMNS,
            clause,
            order_clause(order)
        );

        let mut stmt = conn.prepare(&sql).context("Failed to prepare listing query")?;
        let rows = stmt
            .query_map(params_from_iter(values), read_listing_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query listings")?;

        debug!(?filter, ?order, count = rows.len(), "Listing query");
        rows.into_iter().map(|row| hydrate(&conn, row)).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>> {
        let conn = self.conn.lock().await;
        fetch_one(&conn, &id.to_string())
    }

    async fn find_detail(&self, id: Uuid) -> Result<Option<ListingDetail>> {
        let conn = self.conn.lock().await;
        let key = id.to_string();

        let Some(listing) = fetch_one(&conn, &key)? else {
            return Ok(None);
        };
        let owner = match listing.owner {
            Some(owner_id) => fetch_user(&conn, owner_id)?,
            None => None,
        };
        let reviews = review_details(&conn, &key)?;

        Ok(Some(ListingDetail {
            listing,
            owner,
            reviews,
        }))
    }

    async fn save(&self, listing: &Listing) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let key = listing.id.to_string();

        tx.execute(
            "INSERT INTO listings (id, title, description, image_filename, image_url, price,
                                   location, country, longitude, latitude, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                image_filename = excluded.image_filename,
                image_url = excluded.image_url,
                price = excluded.price,
                location = excluded.location,
                country = excluded.country,
                longitude = excluded.longitude,
                latitude = excluded.latitude,
                owner_id = excluded.owner_id",
            params![
                key,
                listing.title,
                listing.description,
                listing.image.filename,
                listing.image.url,
                listing.price,
                listing.location,
                listing.country,
                listing.geometry.longitude(),
                listing.geometry.latitude(),
                listing.owner.map(|id| id.to_string()),
            ],
        )
        .context("Failed to save listing")?;
        replace_tags(&tx, &key, &listing.category)?;

        tx.commit().context("Failed to commit listing")?;
        Ok(())
    }

    async fn update(&self, id: Uuid, changes: &ListingChanges) -> Result<Option<Listing>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let key = id.to_string();

        let changed = tx
            .execute(
                "UPDATE listings
                 SET title = ?2, description = ?3, price = ?4, location = ?5, country = ?6,
                     longitude = ?7, latitude = ?8
                 WHERE id = ?1",
                params![
                    key,
                    changes.title,
                    changes.description,
                    changes.price,
                    changes.location,
                    changes.country,
                    changes.geometry.longitude(),
                    changes.geometry.latitude(),
                ],
            )
            .context("Failed to update listing")?;
        if changed == 0 {
            return Ok(None);
        }

        if let Some(tags) = &changes.category {
            replace_tags(&tx, &key, tags)?;
        }
        let listing = fetch_one(&tx, &key)?;

        tx.commit().context("Failed to commit listing update")?;
        Ok(listing)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Listing>> {
        let conn = self.conn.lock().await;
        let key = id.to_string();

        let listing = fetch_one(&conn, &key)?;
        if listing.is_some() {
            conn.execute("DELETE FROM listings WHERE id = ?1", params![key])
                .context("Failed to delete listing")?;
        }
        Ok(listing)
    }
}

struct ListingRow {
    id: String,
    title: String,
    description: String,
    image_filename: String,
    image_url: String,
    price: i64,
    location: String,
    country: String,
    longitude: f64,
    latitude: f64,
    owner_id: Option<String>,
}

fn read_listing_row(row: &Row<'_>) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image_filename: row.get(3)?,
        image_url: row.get(4)?,
        price: row.get(5)?,
        location: row.get(6)?,
        country: row.get(7)?,
        longitude: row.get(8)?,
        latitude: row.get(9)?,
        owner_id: row.get(10)?,
    })
}

/// `contains_ci(haystack, needle)`: substring match with Unicode case folding,
/// SQLite's own `lower()` only folds ASCII
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "contains_ci",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack = ctx.get::<String>(0)?;
            let needle = ctx.get::<String>(1)?;
            Ok(haystack.to_lowercase().contains(&needle.to_lowercase()))
        },
    )
    .context("Failed to register contains_ci")?;
    Ok(())
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("Invalid id stored in database: {}", raw))
}

fn where_clause(filter: &ListingFilter) -> (String, Vec<Value>) {
    match filter {
        ListingFilter::All => ("1 = 1".to_string(), Vec::new()),
        ListingFilter::HasCategory(tag) => (
            "EXISTS (SELECT 1 FROM listing_categories c WHERE c.listing_id = l.id AND c.tag = ?1)"
                .to_string(),
            vec![Value::Text(tag.clone())],
        ),
        ListingFilter::Contains { field, needle } => {
            let clause = match field {
                TextField::Title => "contains_ci(l.title, ?1)",
                TextField::Category => {
                    "EXISTS (SELECT 1 FROM listing_categories c \
                     WHERE c.listing_id = l.id AND contains_ci(c.tag, ?1))"
                }
                TextField::Country => "contains_ci(l.country, ?1)",
                TextField::Location => "contains_ci(l.location, ?1)",
            };
            (clause.to_string(), vec![Value::Text(needle.clone())])
        }
        ListingFilter::PriceAtMost(limit) => {
            ("l.price <= ?1".to_string(), vec![Value::Integer(*limit)])
        }
    }
}

fn order_clause(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Insertion => "l.rowid ASC",
        SortOrder::NewestFirst => "l.rowid DESC",
        SortOrder::PriceAscending => "l.price ASC, l.rowid ASC",
    }
}

fn fetch_one(conn: &Connection, key: &str) -> Result<Option<Listing>> {
    let sql = format!("SELECT {} FROM listings l WHERE l.id = ?1", LISTING_COLUMNS);
    let row = conn
        .query_row(&sql, params![key], read_listing_row)
        .optional()
        .context("Failed to fetch listing")?;

    row.map(|row| hydrate(conn, row)).transpose()
}

fn hydrate(conn: &Connection, row: ListingRow) -> Result<Listing> {
    let category = tags_of(conn, &row.id)?;
    let reviews = review_ids_of(conn, &row.id)?;
    let owner = row.owner_id.as_deref().map(parse_id).transpose()?;

    Ok(Listing {
        id: parse_id(&row.id)?,
        title: row.title,
        description: row.description,
        image: Image {
            filename: row.image_filename,
            url: row.image_url,
        },
        price: row.price,
        location: row.location,
        country: row.country,
        category,
        geometry: Geometry::point(row.longitude, row.latitude),
        owner,
        reviews,
    })
}

fn tags_of(conn: &Connection, key: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT tag FROM listing_categories WHERE listing_id = ?1 ORDER BY position",
    )?;
    let tags = stmt
        .query_map(params![key], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()
        .context("Failed to load categories")?;
    Ok(tags)
}

fn review_ids_of(conn: &Connection, key: &str) -> Result<Vec<Uuid>> {
    let mut stmt =
        conn.prepare_cached("SELECT id FROM reviews WHERE listing_id = ?1 ORDER BY rowid")?;
    let ids = stmt
        .query_map(params![key], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to load review ids")?;

    ids.iter().map(|id| parse_id(id)).collect()
}

fn replace_tags(conn: &Connection, key: &str, tags: &[String]) -> Result<()> {
    conn.execute(
        "DELETE FROM listing_categories WHERE listing_id = ?1",
        params![key],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO listing_categories (listing_id, position, tag) VALUES (?1, ?2, ?3)",
    )?;
    for (position, tag) in tags.iter().enumerate() {
        stmt.execute(params![key, position as i64, tag])
            .context("Failed to store category")?;
    }
    Ok(())
}

fn fetch_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let row = conn
        .query_row(
            "SELECT username, email FROM users WHERE id = ?1",
            params![id.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()
        .context("Failed to fetch user")?;

    Ok(row.map(|(username, email)| User {
        id,
        username,
        email,
    }))
}

type ReviewRow = (
    String,
    String,
    u8,
    DateTime<Utc>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn review_details(conn: &Connection, key: &str) -> Result<Vec<ReviewDetail>> {
    let mut stmt = conn.prepare_cached(
        "SELECT r.id, r.comment, r.rating, r.created_at, u.id, u.username, u.email
         FROM reviews r
         LEFT JOIN users u ON u.id = r.author_id
         WHERE r.listing_id = ?1
         ORDER BY r.rowid",
    )?;
    let rows = stmt
        .query_map(params![key], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<ReviewRow>>>()
        .context("Failed to load reviews")?;

    rows.into_iter()
        .map(|(id, comment, rating, created_at, author_id, username, email)| {
            let author = match (author_id, username, email) {
                (Some(author_id), Some(username), Some(email)) => Some(User {
                    id: parse_id(&author_id)?,
                    username,
                    email,
                }),
                _ => None,
            };
            Ok(ReviewDetail {
                id: parse_id(&id)?,
                comment,
                rating,
                created_at,
                author,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_store() -> SqliteListingStore {
        let store = SqliteListingStore::in_memory().unwrap();
        store.create_schema().await.unwrap();
        store
    }

    fn listing(title: &str, price: i64, country: &str, category: &[&str]) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{} description", title),
            image: Image {
                filename: "listings/photo".to_string(),
                url: "https://res.cloudinary.com/demo/image/upload/v1/listings/photo.jpg"
                    .to_string(),
            },
            price,
            location: "Somewhere".to_string(),
            country: country.to_string(),
            category: category.iter().map(|tag| tag.to_string()).collect(),
            geometry: Geometry::fallback(),
            owner: None,
            reviews: Vec::new(),
        }
    }

    fn titles(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.title.as_str()).collect()
    }

    #[tokio::test]
    async fn save_and_fetch_round_trip() {
        let store = create_test_store().await;
        let cabin = listing("Cabin", 900, "Norway", &["Mountains", "Arctic"]);

        store.save(&cabin).await.unwrap();
        let stored = store.find_by_id(cabin.id).await.unwrap().unwrap();

        assert_eq!(stored, cabin);
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_existing_keeps_position() {
        let store = create_test_store().await;
        let mut first = listing("First", 100, "India", &[]);
        let second = listing("Second", 200, "India", &[]);
        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        first.title = "First Renamed".to_string();
        store.save(&first).await.unwrap();

        let all = store.find(&ListingFilter::All, SortOrder::Insertion).await.unwrap();
        assert_eq!(titles(&all), vec!["First Renamed", "Second"]);
    }

    #[tokio::test]
    async fn contains_is_case_insensitive_substring() {
        let store = create_test_store().await;
        store.save(&listing("Beach Villa", 500, "India", &["Beach"])).await.unwrap();
        store.save(&listing("City Loft", 800, "France", &["Iconic Cities"])).await.unwrap();

        let hits = store
            .find(
                &ListingFilter::Contains {
                    field: TextField::Title,
                    needle: "VILL".to_string(),
                },
                SortOrder::Insertion,
            )
            .await
            .unwrap();
        assert_eq!(titles(&hits), vec!["Beach Villa"]);

        let hits = store
            .find(
                &ListingFilter::Contains {
                    field: TextField::Category,
                    needle: "cit".to_string(),
                },
                SortOrder::Insertion,
            )
            .await
            .unwrap();
        assert_eq!(titles(&hits), vec!["City Loft"]);
    }

    #[tokio::test]
    async fn contains_folds_non_ascii_case() {
        let store = create_test_store().await;
        store.save(&listing("cosy élan loft", 650, "France", &["Île Escapes"])).await.unwrap();

        for needle in ["élan", "ÉLAN", "Élan"] {
            let hits = store
                .find(
                    &ListingFilter::Contains {
                        field: TextField::Title,
                        needle: needle.to_string(),
                    },
                    SortOrder::Insertion,
                )
                .await
                .unwrap();
            assert_eq!(titles(&hits), vec!["cosy élan loft"], "needle {}", needle);
        }

        let hits = store
            .find(
                &ListingFilter::Contains {
                    field: TextField::Category,
                    needle: "île".to_string(),
                },
                SortOrder::Insertion,
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn has_category_requires_exact_tag() {
        let store = create_test_store().await;
        store.save(&listing("Dome", 300, "Iceland", &["Domes", "Arctic"])).await.unwrap();

        let exact = store
            .find(&ListingFilter::HasCategory("Arctic".to_string()), SortOrder::Insertion)
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);

        let partial = store
            .find(&ListingFilter::HasCategory("Arc".to_string()), SortOrder::Insertion)
            .await
            .unwrap();
        assert!(partial.is_empty());
    }

    #[tokio::test]
    async fn orders() {
        let store = create_test_store().await;
        store.save(&listing("Mid", 500, "India", &[])).await.unwrap();
        store.save(&listing("Cheap", 100, "India", &[])).await.unwrap();
        store.save(&listing("Pricey", 900, "India", &[])).await.unwrap();

        let newest = store.find(&ListingFilter::All, SortOrder::NewestFirst).await.unwrap();
        assert_eq!(titles(&newest), vec!["Pricey", "Cheap", "Mid"]);

        let cheap = store
            .find(&ListingFilter::PriceAtMost(500), SortOrder::PriceAscending)
            .await
            .unwrap();
        assert_eq!(titles(&cheap), vec!["Cheap", "Mid"]);
    }

    #[tokio::test]
    async fn update_merges_fields_and_keeps_image() {
        let store = create_test_store().await;
        let original = listing("Old", 100, "India", &["Farms"]);
        store.save(&original).await.unwrap();

        let changes = ListingChanges {
            title: "New".to_string(),
            description: "Fresh".to_string(),
            price: 150,
            location: "Goa".to_string(),
            country: "India".to_string(),
            category: None,
            geometry: Geometry::point(73.8, 15.5),
        };
        let updated = store.update(original.id, &changes).await.unwrap().unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.geometry, Geometry::point(73.8, 15.5));
        assert_eq!(updated.category, vec!["Farms".to_string()]);
        assert_eq!(updated.image, original.image);

        assert!(store.update(Uuid::new_v4(), &changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn detail_expands_owner_and_review_authors() {
        let store = create_test_store().await;
        let owner = User {
            id: Uuid::new_v4(),
            username: "host".to_string(),
            email: "host@example.com".to_string(),
        };
        let guest = User {
            id: Uuid::new_v4(),
            username: "guest".to_string(),
            email: "guest@example.com".to_string(),
        };
        store.insert_user(&owner).await.unwrap();
        store.insert_user(&guest).await.unwrap();

        let mut house = listing("House", 400, "Italy", &[]);
        house.owner = Some(owner.id);
        store.save(&house).await.unwrap();

        let review = Review {
            id: Uuid::new_v4(),
            comment: "Lovely".to_string(),
            rating: 5,
            created_at: Utc::now(),
            author: Some(guest.id),
        };
        store.insert_review(house.id, &review).await.unwrap();

        let detail = store.find_detail(house.id).await.unwrap().unwrap();
        assert_eq!(detail.owner, Some(owner));
        assert_eq!(detail.listing.reviews, vec![review.id]);
        assert_eq!(detail.reviews.len(), 1);
        assert_eq!(detail.reviews[0].author, Some(guest));
        assert_eq!(detail.reviews[0].rating, 5);
    }

    #[tokio::test]
    async fn delete_removes_reviews() {
        let store = create_test_store().await;
        let house = listing("House", 400, "Italy", &["Rooms"]);
        store.save(&house).await.unwrap();
        let review = Review {
            id: Uuid::new_v4(),
            comment: "Fine".to_string(),
            rating: 3,
            created_at: Utc::now(),
            author: None,
        };
        store.insert_review(house.id, &review).await.unwrap();

        let removed = store.delete(house.id).await.unwrap();
        assert_eq!(removed.map(|l| l.id), Some(house.id));

        let conn = store.conn.lock().await;
        let reviews: i64 = conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
            .unwrap();
        let tags: i64 = conn
            .query_row("SELECT COUNT(*) FROM listing_categories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(reviews, 0);
        assert_eq!(tags, 0);
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let store = create_test_store().await;
        assert!(store.delete(Uuid::new_v4()).await.unwrap().is_none());
    }
}
