//! Persistence for listings. The trait is synchronous; async callers run it
//! on the blocking pool.

mod memory;
mod postgres;

pub use memory::InMemoryPropertyRepository;
pub use postgres::PgPropertyRepository;

use listing_schema::{
    MediaInsert, OwnerProfile, Page, PageRequest, Property, PropertyFilters, PropertyInsert,
    PropertySummary,
};
use thiserror::Error;

use crate::pagination::{paginate, Identify, InvalidCursor};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("property not found")]
    NotFound,
    /// The reference at `index` in `mediaData` is not an unattached upload of
    /// the caller with the same url and name.
    #[error("media {id} does not exist or cannot be attached")]
    InvalidMedia { index: usize, id: i64 },
    #[error(transparent)]
    InvalidCursor(#[from] InvalidCursor),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}

/// One page worth of rows to load: `take` rows with `id > cursor`, in
/// ascending id order, matching every filter.
#[derive(Debug, Clone, Default)]
pub struct PropertyQuery {
    pub cursor: Option<i64>,
    pub take: i64,
    pub filters: PropertyFilters,
    /// Restricts the page to one user's listings.
    pub owner: Option<String>,
}

pub trait PropertyRepository: Send + Sync + 'static {
    fn get_page(&self, query: &PropertyQuery) -> Result<Vec<PropertySummary>, RepositoryError>;

    /// `Ok(None)` when no listing has this id.
    fn get_by_id(&self, id: i64) -> Result<Option<Property>, RepositoryError>;

    /// Writes the listing, its type details, its purpose details and the
    /// media attachments as one unit. Returns the new listing id.
    fn create_property(&self, user_id: &str, payload: &PropertyInsert) -> Result<i64, RepositoryError>;

    /// Fails with `NotFound` unless `user_id` owns the listing.
    fn delete_property(&self, user_id: &str, property_id: i64) -> Result<i64, RepositoryError>;

    /// Records metadata for an object already in storage. The row stays
    /// unattached until a listing claims it.
    fn insert_media(&self, uploader_id: &str, payload: &MediaInsert) -> Result<i64, RepositoryError>;

    fn upsert_user(&self, profile: &OwnerProfile) -> Result<(), RepositoryError>;
}

impl Identify for PropertySummary {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Runs one paginated listing query against `repository`.
pub fn list_properties(
    repository: &dyn PropertyRepository,
    page: &PageRequest,
    filters: PropertyFilters,
    owner: Option<String>,
) -> Result<Page<PropertySummary>, RepositoryError> {
    paginate(page, |cursor, take| {
        repository.get_page(&PropertyQuery {
            cursor,
            take,
            filters,
            owner,
        })
    })
}

/// Escapes `%`, `_` and `\` so user input only ever matches literally.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
