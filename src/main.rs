use std::{net::SocketAddr, sync::Arc, time::Duration};

use listing_search::{
    app,
    features::listings::repository::PgListingStore,
    services::{database::Database, rate_limiter::SlidingWindowRateLimiter},
    utilities::{app_state::AppState, config::Config, errors::AppError, telemetry::init_tracing},
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let config = Config::init().await?;
    init_tracing(config.tracing_level);

    let database = Database::new(&config).await?;

    let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_seconds),
    ));
    rate_limiter.clone().spawn_sweeper();

    let state = AppState {
        store: Arc::new(PgListingStore::new(database.pool.clone())),
        rate_limiter,
        config: config.clone(),
    };

    let listener = TcpListener::bind(&config.server_address).await?;
    info!("Listing search listening on {}", config.server_address);

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
