use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One client's evaluation of one artisan. `(artisan_id, client_id)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub artisan_id: Uuid,
    pub client_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub is_approved: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Review joined with the reviewing client's display name. The name is absent
/// when the client account has since been deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub artisan_id: Uuid,
    pub client_id: Uuid,
    pub rating: i16,
    pub comment: String,
}
