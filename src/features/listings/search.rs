use tracing::{debug, error};

use crate::{
    features::listings::{
        predicate::{Predicate, SearchScope, build_predicate},
        repository::{ListingStore, Sort},
        schemas::{ListingResponse, ListingSummary, RawSearchRequest},
        validation::validate,
    },
    utilities::errors::AppError,
};

/// Runs one search: validate, build the predicate, count and fetch, assemble.
///
/// The count and the page are two independent store calls, not one
/// transaction. Under concurrent writes `total` and `listings` may come from
/// slightly different snapshots. Store faults are returned as they are, with
/// no retry and never as an empty page.
pub async fn search_listings(
    store: &dyn ListingStore,
    raw: &RawSearchRequest,
    scope: SearchScope,
) -> Result<ListingResponse, AppError> {
    let filter = validate(raw);
    let pagination = filter.pagination;

    debug!(
        "search scope={} filter={:?} page={} limit={}",
        scope, filter, pagination.page, pagination.limit
    );

    let conditions = match build_predicate(&filter, scope) {
        Predicate::Empty => {
            debug!("Unsatisfiable search, skipping the store");
            return Ok(ListingResponse {
                listings: vec![],
                pagination: pagination.meta(0),
            });
        }
        Predicate::Match(conditions) => conditions,
    };

    let (total, rows) = tokio::try_join!(
        store.count(&conditions),
        store.find(
            &conditions,
            Sort::NewestFirst,
            pagination.offset(),
            pagination.limit
        ),
    )
    .inspect_err(|e| error!("Listing search failed: {}", e))?;

    Ok(ListingResponse {
        listings: rows.into_iter().map(ListingSummary::from).collect(),
        pagination: pagination.meta(total),
    })
}
