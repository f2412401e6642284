use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{AccountRepo, ReviewRepo, ReviewTx, StoreResult};
use crate::accounts::model::{
    Account, ArtisanFilter, ArtisanStats, City, GroupCount, NewAccount, Profession, ProfileUpdate,
};
use crate::reviews::aggregator::Aggregate;
use crate::reviews::model::{NewReview, Review, ReviewListing};

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, phone, role, is_active, \
    profession, city, bio, experience, hourly_rate, portfolio, is_premium, rating, \
    review_count, created_at, updated_at";

const REVIEW_COLUMNS: &str =
    "id, artisan_id, client_id, rating, comment, is_approved, created_at, updated_at";

const LISTING_SELECT: &str = r#"
    SELECT r.id, r.artisan_id, r.client_id, r.rating, r.comment, r.is_approved,
           r.created_at, r.updated_at, u.name AS client_name
      FROM reviews r
      LEFT JOIN users u ON u.id = r.client_id
"#;

/// PostgreSQL-backed account and review store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountRepo for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn insert(&self, account: NewAccount) -> StoreResult<Account> {
        let sql = format!(
            r#"
            INSERT INTO users (name, email, password_hash, phone, role,
                               profession, city, bio, experience, hourly_rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Account>(&sql)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.phone)
            .bind(account.role)
            .bind(account.profession)
            .bind(account.city)
            .bind(&account.bio)
            .bind(account.experience)
            .bind(account.hourly_rate)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> StoreResult<Option<Account>> {
        let sql = format!(
            r#"
            UPDATE users
               SET name        = COALESCE($2, name),
                   phone       = COALESCE($3, phone),
                   bio         = COALESCE($4, bio),
                   experience  = COALESCE($5, experience),
                   hourly_rate = COALESCE($6, hourly_rate),
                   profession  = COALESCE($7, profession),
                   city        = COALESCE($8, city),
                   updated_at  = now()
             WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.phone)
            .bind(update.bio)
            .bind(update.experience)
            .bind(update.hourly_rate)
            .bind(update.profession)
            .bind(update.city)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> StoreResult<Option<Account>> {
        let sql = format!(
            "UPDATE users SET is_active = $2, updated_at = now() WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> StoreResult<Vec<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, Account>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_artisans(&self, filter: &ArtisanFilter) -> StoreResult<Vec<Account>> {
        let sql = format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
              FROM users
             WHERE role = 'artisan'
               AND is_active
               AND ($1::profession IS NULL OR profession = $1)
               AND ($2::city IS NULL OR city = $2)
             ORDER BY {}
            "#,
            filter.sort.order_by()
        );
        let rows = sqlx::query_as::<_, Account>(&sql)
            .bind(filter.profession)
            .bind(filter.city)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_artisan(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1 AND role = 'artisan'");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn artisan_stats(&self) -> StoreResult<ArtisanStats> {
        let (total_artisans, premium_artisans) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE is_premium)
              FROM users
             WHERE role = 'artisan' AND is_active
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let professions = sqlx::query_as::<_, (Option<Profession>, i64)>(
            r#"
            SELECT profession, COUNT(*)
              FROM users
             WHERE role = 'artisan' AND is_active
             GROUP BY profession
             ORDER BY COUNT(*) DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let cities = sqlx::query_as::<_, (Option<City>, i64)>(
            r#"
            SELECT city, COUNT(*)
              FROM users
             WHERE role = 'artisan' AND is_active
             GROUP BY city
             ORDER BY COUNT(*) DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ArtisanStats {
            total_artisans,
            premium_artisans,
            profession_stats: professions
                .into_iter()
                .map(|(key, count)| GroupCount { key, count })
                .collect(),
            city_stats: cities
                .into_iter()
                .map(|(key, count)| GroupCount { key, count })
                .collect(),
        })
    }
}

#[async_trait]
impl ReviewRepo for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn ReviewTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgReviewTx { tx }))
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn list_approved_by_artisan(&self, artisan_id: Uuid) -> StoreResult<Vec<ReviewListing>> {
        let sql = format!(
            "{LISTING_SELECT} WHERE r.artisan_id = $1 AND r.is_approved \
             ORDER BY r.created_at DESC, r.id"
        );
        let rows = sqlx::query_as::<_, ReviewListing>(&sql)
            .bind(artisan_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_all(&self) -> StoreResult<Vec<ReviewListing>> {
        let sql = format!("{LISTING_SELECT} ORDER BY r.created_at DESC, r.id");
        let rows = sqlx::query_as::<_, ReviewListing>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

pub struct PgReviewTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ReviewTx for PgReviewTx {
    async fn lock_account(&mut self, id: Uuid) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(account)
    }

    async fn insert_review(&mut self, review: &NewReview) -> StoreResult<Review> {
        let sql = format!(
            r#"
            INSERT INTO reviews (artisan_id, client_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Review>(&sql)
            .bind(review.artisan_id)
            .bind(review.client_id)
            .bind(review.rating)
            .bind(&review.comment)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(created)
    }

    async fn set_approval(&mut self, id: Uuid, is_approved: bool) -> StoreResult<Option<Review>> {
        let sql = format!(
            "UPDATE reviews SET is_approved = $2, updated_at = now() WHERE id = $1 \
             RETURNING {REVIEW_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(is_approved)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(updated)
    }

    async fn delete_review(&mut self, id: Uuid) -> StoreResult<Option<Review>> {
        let sql = format!("DELETE FROM reviews WHERE id = $1 RETURNING {REVIEW_COLUMNS}");
        let deleted = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(deleted)
    }

    async fn write_aggregate(&mut self, artisan_id: Uuid) -> StoreResult<Option<Aggregate>> {
        // ROUND(numeric, 1) rounds half away from zero.
        let row = sqlx::query_as::<_, (f64, i64)>(
            r#"
            UPDATE users AS u
               SET rating = s.rating,
                   review_count = s.review_count
              FROM (
                    SELECT COALESCE(ROUND(AVG(rating), 1), 0)::float8 AS rating,
                           COUNT(*) AS review_count
                      FROM reviews
                     WHERE artisan_id = $1 AND is_approved
                   ) AS s
             WHERE u.id = $1
            RETURNING u.rating, u.review_count
            "#,
        )
        .bind(artisan_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(|(rating, review_count)| Aggregate {
            rating,
            review_count,
        }))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
