use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    features::listings::repository::ListingStore, services::rate_limiter::RateLimit,
    utilities::config::Config,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ListingStore>,
    pub rate_limiter: Arc<dyn RateLimit>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn ListingStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<dyn RateLimit> {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
