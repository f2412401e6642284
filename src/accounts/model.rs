use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
pub enum Role {
    Client,
    Artisan,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "profession", rename_all = "lowercase")]
pub enum Profession {
    Carpenter,
    Painter,
    Plumber,
    Electrician,
    Mason,
    Mechanic,
    Welder,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "city", rename_all = "lowercase")]
pub enum City {
    Casablanca,
    Rabat,
    Marrakech,
    Fes,
    Tangier,
    Agadir,
    Other,
}

/// Account record in the `users` table.
///
/// `rating` and `review_count` are derived from approved reviews and are only
/// ever written by [`crate::reviews::aggregator`].
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    pub profession: Option<Profession>,
    pub city: Option<City>,
    pub bio: Option<String>,
    pub experience: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub portfolio: Vec<String>,
    pub is_premium: bool,
    pub rating: f64,
    pub review_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Account {
    pub fn is_artisan(&self) -> bool {
        self.role == Role::Artisan
    }
}

/// Validated registration data, password already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: Role,
    pub profession: Option<Profession>,
    pub city: Option<City>,
    pub bio: Option<String>,
    pub experience: Option<i32>,
    pub hourly_rate: Option<f64>,
}

/// Client-writable profile fields. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub experience: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub profession: Option<Profession>,
    pub city: Option<City>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtisanSort {
    #[default]
    RatingDesc,
    RatingAsc,
    ReviewCountDesc,
    HourlyRateAsc,
    HourlyRateDesc,
    Newest,
}

impl ArtisanSort {
    /// Parses the `sort` query value, `-` prefix meaning descending.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "-rating" => Some(Self::RatingDesc),
            "rating" => Some(Self::RatingAsc),
            "-reviewCount" => Some(Self::ReviewCountDesc),
            "hourlyRate" => Some(Self::HourlyRateAsc),
            "-hourlyRate" => Some(Self::HourlyRateDesc),
            "-createdAt" => Some(Self::Newest),
            _ => None,
        }
    }

    pub(crate) fn order_by(self) -> &'static str {
        match self {
            Self::RatingDesc => "rating DESC, review_count DESC, created_at DESC",
            Self::RatingAsc => "rating ASC, created_at DESC",
            Self::ReviewCountDesc => "review_count DESC, rating DESC",
            Self::HourlyRateAsc => "hourly_rate ASC NULLS LAST",
            Self::HourlyRateDesc => "hourly_rate DESC NULLS LAST",
            Self::Newest => "created_at DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArtisanFilter {
    pub profession: Option<Profession>,
    pub city: Option<City>,
    pub sort: ArtisanSort,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupCount<T> {
    #[serde(rename = "_id")]
    pub key: T,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtisanStats {
    pub total_artisans: i64,
    pub premium_artisans: i64,
    pub profession_stats: Vec<GroupCount<Option<Profession>>>,
    pub city_stats: Vec<GroupCount<Option<City>>>,
}
