use std::{
    cmp::Reverse,
    sync::{
        PoisonError, RwLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    features::listings::{
        indexes::IndexShape,
        models::ListingJoined,
        predicate::Conditions,
        repository::{ListingStore, Sort},
    },
    utilities::errors::AppError,
};

/// Listing store held in process memory. Evaluates conditions with the same
/// semantics as the Postgres store, counts calls, and can be switched into an
/// unavailable state.
#[derive(Default)]
pub struct MemoryListingStore {
    listings: RwLock<Vec<ListingJoined>>,
    indexes: RwLock<Vec<&'static str>>,
    count_calls: AtomicUsize,
    find_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryListingStore {
    pub fn new(listings: Vec<ListingJoined>) -> Self {
        Self {
            listings: RwLock::new(listings),
            ..Self::default()
        }
    }

    pub fn insert(&self, listing: ListingJoined) {
        self.listings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listing);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Store round-trips served so far, counts and finds together.
    pub fn calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst) + self.find_calls.load(Ordering::SeqCst)
    }

    pub fn ensured_indexes(&self) -> Vec<&'static str> {
        self.indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable(
                "memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn count(&self, conditions: &Conditions) -> Result<i64, AppError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let listings = self.listings.read().unwrap_or_else(PoisonError::into_inner);
        let total = listings.iter().filter(|l| conditions.matches(l)).count();

        i64::try_from(total).map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn find(
        &self,
        conditions: &Conditions,
        sort: Sort,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<ListingJoined>, AppError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let listings = self.listings.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched: Vec<ListingJoined> = listings
            .iter()
            .filter(|l| conditions.matches(l))
            .cloned()
            .collect();

        match sort {
            Sort::NewestFirst => {
                matched.sort_by_key(|l| Reverse((l.listing_created_at, l.listing_id)))
            }
        }

        Ok(matched
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn ensure_index(&self, index: &IndexShape) -> Result<(), AppError> {
        self.check_available()?;

        let mut indexes = self.indexes.write().unwrap_or_else(PoisonError::into_inner);
        if !indexes.contains(&index.name) {
            indexes.push(index.name);
        }
        Ok(())
    }
}
