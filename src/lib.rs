pub mod features;
pub mod services;
pub mod utilities;

use axum::{
    Json, Router,
    http::{HeaderValue, Method},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::utilities::app_state::AppState;

async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            state.config.frontend_endpoint.parse::<HeaderValue>().ok(),
        ))
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .merge(features::listings::routes(state.clone()))
        .route("/api/v1/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
