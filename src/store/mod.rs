//! Persistence seams for accounts and reviews.
//!
//! Review mutations run through a [`ReviewTx`]: the transaction locks the
//! artisan's account row first, so every "mutate review, recompute aggregate"
//! sequence for one artisan is serialized by the database itself.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::accounts::model::{Account, ArtisanFilter, ArtisanStats, NewAccount, ProfileUpdate};
use crate::reviews::aggregator::Aggregate;
use crate::reviews::model::{NewReview, Review, ReviewListing};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

pub(crate) const DUPLICATE_EMAIL: &str = "email already registered";
pub(crate) const DUPLICATE_REVIEW: &str = "you have already reviewed this artisan";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23505") {
                let what = match db_err.constraint() {
                    Some("users_email_key") => DUPLICATE_EMAIL,
                    Some("reviews_artisan_client_key") => DUPLICATE_REVIEW,
                    _ => "record already exists",
                };
                return StoreError::UniqueViolation(what.to_string());
            }
        }
        StoreError::Backend(anyhow::Error::new(e).context("database query"))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Credential store and profile directory.
#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;
    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;
    async fn insert(&self, account: NewAccount) -> StoreResult<Account>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate)
        -> StoreResult<Option<Account>>;
    async fn set_active(&self, id: Uuid, is_active: bool) -> StoreResult<Option<Account>>;
    /// Returns false when no account had that id.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    async fn list_all(&self) -> StoreResult<Vec<Account>>;
    /// Active artisans matching the filter.
    async fn list_artisans(&self, filter: &ArtisanFilter) -> StoreResult<Vec<Account>>;
    async fn find_artisan(&self, id: Uuid) -> StoreResult<Option<Account>>;
    async fn artisan_stats(&self) -> StoreResult<ArtisanStats>;
}

#[async_trait]
pub trait ReviewRepo: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn ReviewTx>>;
    async fn find(&self, id: Uuid) -> StoreResult<Option<Review>>;
    /// Approved reviews of one artisan, newest first.
    async fn list_approved_by_artisan(&self, artisan_id: Uuid) -> StoreResult<Vec<ReviewListing>>;
    /// Every review regardless of approval, newest first.
    async fn list_all(&self) -> StoreResult<Vec<ReviewListing>>;
}

/// A unit of work over reviews and the aggregate fields of one artisan.
/// Dropping it without [`ReviewTx::commit`] rolls everything back.
#[async_trait]
pub trait ReviewTx: Send {
    /// Takes the row lock on the account, held until the transaction ends.
    async fn lock_account(&mut self, id: Uuid) -> StoreResult<Option<Account>>;
    async fn insert_review(&mut self, review: &NewReview) -> StoreResult<Review>;
    async fn set_approval(&mut self, id: Uuid, is_approved: bool) -> StoreResult<Option<Review>>;
    async fn delete_review(&mut self, id: Uuid) -> StoreResult<Option<Review>>;
    /// Recomputes the aggregate from approved reviews and writes it onto the
    /// account in a single statement. `None` when the account does not exist.
    async fn write_aggregate(&mut self, artisan_id: Uuid) -> StoreResult<Option<Aggregate>>;
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
