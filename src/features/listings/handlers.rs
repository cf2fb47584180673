use std::sync::Arc;

use axum::{
    Json,
    extract::{RawQuery, State},
};
use tracing::debug;

use crate::{
    features::listings::{
        predicate::SearchScope,
        repository::ListingStore,
        schemas::{ListingResponse, RawSearchRequest},
        search::search_listings,
    },
    utilities::{errors::AppError, jwt::Claims},
};

pub async fn get_many_listings_handler(
    State(store): State<Arc<dyn ListingStore>>,
    RawQuery(query): RawQuery,
) -> Result<Json<ListingResponse>, AppError> {
    let raw = RawSearchRequest::from_query(query.as_deref().unwrap_or_default());

    let response = search_listings(store.as_ref(), &raw, SearchScope::Public).await?;

    Ok(Json(response))
}

pub async fn get_my_listings_handler(
    claims: Claims,
    State(store): State<Arc<dyn ListingStore>>,
    RawQuery(query): RawQuery,
) -> Result<Json<ListingResponse>, AppError> {
    debug!("owner search for user {}", claims.sub);

    let raw = RawSearchRequest::from_query(query.as_deref().unwrap_or_default());

    let response = search_listings(store.as_ref(), &raw, SearchScope::Owner(claims.sub)).await?;

    Ok(Json(response))
}
