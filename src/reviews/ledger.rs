use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::aggregator::{self, Aggregate};
use super::model::{NewReview, Review, ReviewListing};
use crate::auth::gate::{self, Identity};
use crate::error::ApiError;
use crate::store::ReviewRepo;
use crate::validation::{validate_comment, validate_rating};

/// Mediates every review mutation. Each successful write recomputes the
/// affected artisan's aggregate in the same store transaction before
/// returning, so callers never observe a stale rating.
#[derive(Clone)]
pub struct ReviewLedger {
    repo: Arc<dyn ReviewRepo>,
}

impl ReviewLedger {
    pub fn new(repo: Arc<dyn ReviewRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        client_id: Uuid,
        artisan_id: Uuid,
        rating: f64,
        comment: &str,
    ) -> Result<Review, ApiError> {
        let rating = validate_rating(rating)?;
        let comment = validate_comment(comment)?;
        if client_id == artisan_id {
            return Err(ApiError::forbidden("you cannot review yourself"));
        }

        let mut tx = self.repo.begin().await?;
        tx.lock_account(artisan_id)
            .await?
            .filter(|a| a.is_artisan())
            .ok_or(ApiError::NotFound("artisan"))?;

        let review = tx
            .insert_review(&NewReview {
                artisan_id,
                client_id,
                rating,
                comment,
            })
            .await
            .map_err(|e| {
                warn!(%artisan_id, %client_id, error = %e, "review insert rejected");
                e
            })?;
        aggregator::recompute(tx.as_mut(), artisan_id).await?;
        tx.commit().await?;

        info!(review_id = %review.id, %artisan_id, %client_id, rating, "review created");
        Ok(review)
    }

    /// Moderation toggle. Callers must have passed the admin gate.
    pub async fn set_approval(&self, review_id: Uuid, is_approved: bool) -> Result<Review, ApiError> {
        let existing = self
            .repo
            .find(review_id)
            .await?
            .ok_or(ApiError::NotFound("review"))?;

        let mut tx = self.repo.begin().await?;
        tx.lock_account(existing.artisan_id).await?;
        let review = tx
            .set_approval(review_id, is_approved)
            .await?
            .ok_or(ApiError::NotFound("review"))?;
        aggregator::recompute(tx.as_mut(), review.artisan_id).await?;
        tx.commit().await?;

        info!(%review_id, artisan_id = %review.artisan_id, is_approved, "review approval updated");
        Ok(review)
    }

    pub async fn delete(&self, review_id: Uuid, requester: &Identity) -> Result<(), ApiError> {
        let existing = self
            .repo
            .find(review_id)
            .await?
            .ok_or(ApiError::NotFound("review"))?;
        gate::ensure_owner_or_admin(requester, existing.client_id)?;

        let mut tx = self.repo.begin().await?;
        tx.lock_account(existing.artisan_id).await?;
        let deleted = tx
            .delete_review(review_id)
            .await?
            .ok_or(ApiError::NotFound("review"))?;
        aggregator::recompute(tx.as_mut(), deleted.artisan_id).await?;
        tx.commit().await?;

        info!(%review_id, artisan_id = %deleted.artisan_id, requester = %requester.id, "review deleted");
        Ok(())
    }

    pub async fn list_by_artisan(&self, artisan_id: Uuid) -> Result<Vec<ReviewListing>, ApiError> {
        Ok(self.repo.list_approved_by_artisan(artisan_id).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<ReviewListing>, ApiError> {
        Ok(self.repo.list_all().await?)
    }

    /// Standalone recomputation; safe to repeat.
    pub async fn recompute(&self, artisan_id: Uuid) -> Result<Aggregate, ApiError> {
        let mut tx = self.repo.begin().await?;
        tx.lock_account(artisan_id)
            .await?
            .filter(|a| a.is_artisan())
            .ok_or(ApiError::NotFound("artisan"))?;
        let aggregate = aggregator::recompute(tx.as_mut(), artisan_id)
            .await?
            .ok_or(ApiError::NotFound("artisan"))?;
        tx.commit().await?;
        Ok(aggregate)
    }
}
