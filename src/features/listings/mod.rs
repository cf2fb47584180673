pub mod handlers;
pub mod implementations;
pub mod indexes;
pub mod models;
pub mod predicate;
pub mod repository;
pub mod schemas;
pub mod search;
pub mod validation;

use axum::{Router, middleware, routing::get};

use crate::{services::rate_limiter::rate_limit, utilities::app_state::AppState};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/listings", get(handlers::get_many_listings_handler))
        .route("/api/v1/listings/mine", get(handlers::get_my_listings_handler))
        .route_layer(middleware::from_fn_with_state(state, rate_limit))
}
