//! Reputation aggregation.
//!
//! An artisan's `rating`/`reviewCount` pair is always recomputed from the
//! full set of approved reviews, never adjusted incrementally, so a retried or
//! repeated recomputation converges on the same value.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{ReviewTx, StoreResult};

/// Derived reputation stored on an artisan's account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    /// Mean of approved ratings rounded to one decimal, 0 when there are none.
    pub rating: f64,
    pub review_count: i64,
}

#[cfg(test)]
impl Aggregate {
    pub const EMPTY: Aggregate = Aggregate {
        rating: 0.0,
        review_count: 0,
    };

    /// Reference computation over a set of approved ratings; the SQL store
    /// performs the same computation server-side.
    pub fn from_ratings(ratings: &[i16]) -> Self {
        if ratings.is_empty() {
            return Self::EMPTY;
        }
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let count = ratings.len() as i64;
        Self {
            rating: round_to_tenth(sum as f64 / count as f64),
            review_count: count,
        }
    }
}

/// `round(x * 10) / 10` with halves rounded away from zero.
#[cfg(test)]
pub fn round_to_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Recomputes and persists the aggregate for `artisan_id` inside `tx`.
///
/// The caller must already hold the artisan's row lock in `tx`. Returns `None`
/// if the account no longer exists (a dangling review of a deleted account).
pub async fn recompute(
    tx: &mut dyn ReviewTx,
    artisan_id: Uuid,
) -> StoreResult<Option<Aggregate>> {
    let aggregate = tx.write_aggregate(artisan_id).await?;
    match aggregate {
        Some(agg) => info!(
            %artisan_id,
            rating = agg.rating,
            review_count = agg.review_count,
            "reputation recomputed"
        ),
        None => debug!(%artisan_id, "reputation target missing; nothing to update"),
    }
    Ok(aggregate)
}
