//! In-memory store for tests. A transaction takes the single table lock for
//! its whole lifetime and works on a staged copy that replaces the tables on
//! commit, so dropping it is a rollback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    AccountRepo, ReviewRepo, ReviewTx, StoreError, StoreResult, DUPLICATE_EMAIL, DUPLICATE_REVIEW,
};
use crate::accounts::model::{
    Account, ArtisanFilter, ArtisanSort, ArtisanStats, GroupCount, NewAccount, ProfileUpdate, Role,
};
use crate::reviews::aggregator::Aggregate;
use crate::reviews::model::{NewReview, Review, ReviewListing};

#[derive(Clone, Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    reviews: HashMap<Uuid, Review>,
    last_stamp: Option<OffsetDateTime>,
}

impl Tables {
    /// Strictly increasing timestamps keep newest-first ordering deterministic.
    fn stamp(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let next = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(next);
        next
    }

    fn listing(&self, review: &Review) -> ReviewListing {
        ReviewListing {
            review: review.clone(),
            client_name: self
                .accounts
                .get(&review.client_id)
                .map(|a| a.name.clone()),
        }
    }

    fn sorted_listings<'a>(&self, reviews: impl Iterator<Item = &'a Review>) -> Vec<ReviewListing> {
        let mut out: Vec<ReviewListing> = reviews.map(|r| self.listing(r)).collect();
        out.sort_by(|a, b| b.review.created_at.cmp(&a.review.created_at));
        out
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_aggregation: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an account directly; the name is the email's local part.
    pub async fn seed(&self, role: Role, email: &str) -> Account {
        let name = email.split('@').next().unwrap_or(email).to_string();
        let (profession, city) = match role {
            Role::Artisan => (
                Some(crate::accounts::model::Profession::Plumber),
                Some(crate::accounts::model::City::Rabat),
            ),
            _ => (None, None),
        };
        self.insert(NewAccount {
            name,
            email: email.to_string(),
            password_hash: "unused".into(),
            phone: "0612345678".into(),
            role,
            profession,
            city,
            bio: None,
            experience: None,
            hourly_rate: None,
        })
        .await
        .expect("seed account")
    }

    /// Makes every subsequent aggregate write fail as if the backend were down.
    pub fn fail_aggregation(&self, fail: bool) {
        self.fail_aggregation.store(fail, Ordering::SeqCst);
    }

    /// Corrupts the stored aggregate, bypassing the aggregator.
    pub async fn overwrite_aggregate(&self, id: Uuid, rating: f64, review_count: i64) {
        let mut tables = self.tables.lock().await;
        let account = tables.accounts.get_mut(&id).expect("account exists");
        account.rating = rating;
        account.review_count = review_count;
    }

    pub async fn set_premium(&self, id: Uuid, is_premium: bool) {
        let mut tables = self.tables.lock().await;
        if let Some(account) = tables.accounts.get_mut(&id) {
            account.is_premium = is_premium;
        }
    }
}

fn sort_artisans(rows: &mut [Account], sort: ArtisanSort) {
    match sort {
        ArtisanSort::RatingDesc => rows.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then(b.review_count.cmp(&a.review_count))
        }),
        ArtisanSort::RatingAsc => rows.sort_by(|a, b| a.rating.total_cmp(&b.rating)),
        ArtisanSort::ReviewCountDesc => rows.sort_by(|a, b| b.review_count.cmp(&a.review_count)),
        ArtisanSort::HourlyRateAsc => rows.sort_by(|a, b| {
            let a = a.hourly_rate.unwrap_or(f64::INFINITY);
            let b = b.hourly_rate.unwrap_or(f64::INFINITY);
            a.total_cmp(&b)
        }),
        ArtisanSort::HourlyRateDesc => rows.sort_by(|a, b| {
            let a = a.hourly_rate.unwrap_or(f64::NEG_INFINITY);
            let b = b.hourly_rate.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        }),
        ArtisanSort::Newest => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

fn group_counts<K: PartialEq + Clone>(keys: impl Iterator<Item = K>) -> Vec<GroupCount<K>> {
    let mut out: Vec<GroupCount<K>> = Vec::new();
    for key in keys {
        match out.iter_mut().find(|g| g.key == key) {
            Some(group) => group.count += 1,
            None => out.push(GroupCount { key, count: 1 }),
        }
    }
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

#[async_trait]
impl AccountRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.tables.lock().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let email = email.to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.email.to_lowercase() == email)
            .cloned())
    }

    async fn insert(&self, new: NewAccount) -> StoreResult<Account> {
        let mut tables = self.tables.lock().await;
        let email = new.email.to_lowercase();
        if tables.accounts.values().any(|a| a.email.to_lowercase() == email) {
            return Err(StoreError::UniqueViolation(DUPLICATE_EMAIL.into()));
        }
        let now = tables.stamp();
        let account = Account {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            phone: new.phone,
            role: new.role,
            is_active: true,
            profession: new.profession,
            city: new.city,
            bio: new.bio,
            experience: new.experience,
            hourly_rate: new.hourly_rate,
            portfolio: Vec::new(),
            is_premium: false,
            rating: 0.0,
            review_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Option<Account>> {
        let mut tables = self.tables.lock().await;
        let now = tables.stamp();
        let Some(account) = tables.accounts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(phone) = update.phone {
            account.phone = phone;
        }
        if update.bio.is_some() {
            account.bio = update.bio;
        }
        if update.experience.is_some() {
            account.experience = update.experience;
        }
        if update.hourly_rate.is_some() {
            account.hourly_rate = update.hourly_rate;
        }
        if update.profession.is_some() {
            account.profession = update.profession;
        }
        if update.city.is_some() {
            account.city = update.city;
        }
        account.updated_at = now;
        Ok(Some(account.clone()))
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> StoreResult<Option<Account>> {
        let mut tables = self.tables.lock().await;
        let now = tables.stamp();
        Ok(tables.accounts.get_mut(&id).map(|a| {
            a.is_active = is_active;
            a.updated_at = now;
            a.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.lock().await.accounts.remove(&id).is_some())
    }

    async fn list_all(&self) -> StoreResult<Vec<Account>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Account> = tables.accounts.values().cloned().collect();
        sort_artisans(&mut rows, ArtisanSort::Newest);
        Ok(rows)
    }

    async fn list_artisans(&self, filter: &ArtisanFilter) -> StoreResult<Vec<Account>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Account> = tables
            .accounts
            .values()
            .filter(|a| a.is_artisan() && a.is_active)
            .filter(|a| filter.profession.map_or(true, |p| a.profession == Some(p)))
            .filter(|a| filter.city.map_or(true, |c| a.city == Some(c)))
            .cloned()
            .collect();
        sort_artisans(&mut rows, filter.sort);
        Ok(rows)
    }

    async fn find_artisan(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let tables = self.tables.lock().await;
        Ok(tables.accounts.get(&id).filter(|a| a.is_artisan()).cloned())
    }

    async fn artisan_stats(&self) -> StoreResult<ArtisanStats> {
        let tables = self.tables.lock().await;
        let active: Vec<&Account> = tables
            .accounts
            .values()
            .filter(|a| a.is_artisan() && a.is_active)
            .collect();
        Ok(ArtisanStats {
            total_artisans: active.len() as i64,
            premium_artisans: active.iter().filter(|a| a.is_premium).count() as i64,
            profession_stats: group_counts(active.iter().map(|a| a.profession)),
            city_stats: group_counts(active.iter().map(|a| a.city)),
        })
    }
}

#[async_trait]
impl ReviewRepo for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn ReviewTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            staged,
            fail_aggregation: self.fail_aggregation.load(Ordering::SeqCst),
        }))
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self.tables.lock().await.reviews.get(&id).cloned())
    }

    async fn list_approved_by_artisan(&self, artisan_id: Uuid) -> StoreResult<Vec<ReviewListing>> {
        let tables = self.tables.lock().await;
        Ok(tables.sorted_listings(
            tables
                .reviews
                .values()
                .filter(|r| r.artisan_id == artisan_id && r.is_approved),
        ))
    }

    async fn list_all(&self) -> StoreResult<Vec<ReviewListing>> {
        let tables = self.tables.lock().await;
        Ok(tables.sorted_listings(tables.reviews.values()))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    fail_aggregation: bool,
}

#[async_trait]
impl ReviewTx for MemoryTx {
    async fn lock_account(&mut self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.staged.accounts.get(&id).cloned())
    }

    async fn insert_review(&mut self, new: &NewReview) -> StoreResult<Review> {
        let duplicate = self
            .staged
            .reviews
            .values()
            .any(|r| r.artisan_id == new.artisan_id && r.client_id == new.client_id);
        if duplicate {
            return Err(StoreError::UniqueViolation(DUPLICATE_REVIEW.into()));
        }
        let now = self.staged.stamp();
        let review = Review {
            id: Uuid::new_v4(),
            artisan_id: new.artisan_id,
            client_id: new.client_id,
            rating: new.rating,
            comment: new.comment.clone(),
            is_approved: true,
            created_at: now,
            updated_at: now,
        };
        self.staged.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn set_approval(&mut self, id: Uuid, is_approved: bool) -> StoreResult<Option<Review>> {
        let now = self.staged.stamp();
        Ok(self.staged.reviews.get_mut(&id).map(|r| {
            r.is_approved = is_approved;
            r.updated_at = now;
            r.clone()
        }))
    }

    async fn delete_review(&mut self, id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self.staged.reviews.remove(&id))
    }

    async fn write_aggregate(&mut self, artisan_id: Uuid) -> StoreResult<Option<Aggregate>> {
        if self.fail_aggregation {
            return Err(StoreError::Backend(anyhow::anyhow!("store unavailable")));
        }
        let ratings: Vec<i16> = self
            .staged
            .reviews
            .values()
            .filter(|r| r.artisan_id == artisan_id && r.is_approved)
            .map(|r| r.rating)
            .collect();
        let aggregate = Aggregate::from_ratings(&ratings);
        Ok(self.staged.accounts.get_mut(&artisan_id).map(|a| {
            a.rating = aggregate.rating;
            a.review_count = aggregate.review_count;
            aggregate
        }))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}
