use listing_search::{
    features::listings::{indexes::provision_indexes, repository::PgListingStore},
    services::database::Database,
    utilities::{config::Config, errors::AppError, telemetry::init_tracing},
};
use tracing::info;

/// Creates the listing search indexes. Safe to rerun against a live store.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let config = Config::init().await?;
    init_tracing(config.tracing_level);

    let database = Database::new(&config).await?;
    let store = PgListingStore::new(database.pool);

    provision_indexes(&store).await?;
    info!("Index provisioning finished");

    Ok(())
}
