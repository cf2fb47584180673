use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::{
    features::listings::{
        indexes::IndexShape,
        models::ListingJoined,
        predicate::{Conditions, Term},
    },
    utilities::errors::AppError,
};

/// Result ordering. Stable across pages because `id` breaks ties.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum Sort {
    /// `created_at DESC, id DESC`
    #[default]
    NewestFirst,
}

/// Read access to listings. Implementations must honour every term of the
/// conditions and return rows already joined with their owner.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn count(&self, conditions: &Conditions) -> Result<i64, AppError>;

    async fn find(
        &self,
        conditions: &Conditions,
        sort: Sort,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<ListingJoined>, AppError>;

    async fn ensure_index(&self, index: &IndexShape) -> Result<(), AppError>;
}

const SELECT_LISTINGS: &str = r#"
    SELECT
        l.id AS listing_id,
        l.title,
        l.description,
        l.address,
        l.price,
        l.bedrooms,
        l.bathrooms,
        l.square_feet,
        l.property_type,
        l.status,
        l.latitude,
        l.longitude,
        l.created_at AS listing_created_at,
        l.updated_at AS listing_updated_at,

        -- owner fields ...
        u.id AS owner_id,
        u.full_name AS owner_full_name,
        u.email AS owner_email,

        COALESCE(
            (SELECT jsonb_agg(la.amenity ORDER BY la.amenity)
             FROM listing_amenities la WHERE la.listing_id = l.id),
            '[]'::jsonb
        ) AS "amenities"
    FROM listings l
    JOIN users u ON u.id = l.owner_id
    WHERE 1=1
"#;

const COUNT_LISTINGS: &str = r#"
    SELECT COUNT(*)
    FROM listings l
    JOIN users u ON u.id = l.owner_id
    WHERE 1=1
"#;

fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, conditions: &Conditions) {
    for term in conditions.terms() {
        match term {
            Term::Status(status) => {
                qb.push(" AND l.status = ").push_bind(*status);
            }
            Term::Owner(owner_id) => {
                qb.push(" AND l.owner_id = ").push_bind(*owner_id);
            }
            Term::PriceRange { min, max } => {
                if let Some(min) = min {
                    qb.push(" AND l.price >= ").push_bind(min.clone());
                }
                if let Some(max) = max {
                    qb.push(" AND l.price <= ").push_bind(max.clone());
                }
            }
            Term::Bedrooms(bedrooms) => {
                qb.push(" AND l.bedrooms = ").push_bind(*bedrooms);
            }
            Term::Bathrooms(bathrooms) => {
                qb.push(" AND l.bathrooms = ").push_bind(bathrooms.clone());
            }
            Term::PropertyType(property_type) => {
                qb.push(" AND l.property_type = ")
                    .push_bind(property_type.clone());
            }
            Term::AmenitiesAny(amenities) => {
                qb.push(" AND EXISTS (SELECT 1 FROM listing_amenities la")
                    .push(" WHERE la.listing_id = l.id AND la.amenity = ANY(")
                    .push_bind(amenities.clone())
                    .push("))");
            }
            Term::Text(pattern) => {
                qb.push(" AND (l.title ~* ")
                    .push_bind(pattern.as_str().to_string())
                    .push(" OR l.description ~* ")
                    .push_bind(pattern.as_str().to_string())
                    .push(" OR l.address ~* ")
                    .push_bind(pattern.as_str().to_string())
                    .push(")");
            }
        }
    }
}

fn count_query(conditions: &Conditions) -> QueryBuilder<'static, Postgres> {
    let mut count_qb = QueryBuilder::new(COUNT_LISTINGS);
    push_conditions(&mut count_qb, conditions);
    count_qb
}

fn find_query(
    conditions: &Conditions,
    sort: Sort,
    skip: i64,
    limit: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut listing_qb = QueryBuilder::new(SELECT_LISTINGS);
    push_conditions(&mut listing_qb, conditions);

    match sort {
        Sort::NewestFirst => listing_qb.push(" ORDER BY l.created_at DESC, l.id DESC"),
    };
    listing_qb.push(" OFFSET ").push_bind(skip);
    listing_qb.push(" LIMIT ").push_bind(limit);

    listing_qb
}

#[derive(Clone)]
pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn count(&self, conditions: &Conditions) -> Result<i64, AppError> {
        count_query(conditions)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_store)
    }

    async fn find(
        &self,
        conditions: &Conditions,
        sort: Sort,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<ListingJoined>, AppError> {
        let mut listing_qb = find_query(conditions, sort, skip, limit);

        debug!("listing query: {}", listing_qb.sql());

        listing_qb
            .build_query_as::<ListingJoined>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_store)
    }

    async fn ensure_index(&self, index: &IndexShape) -> Result<(), AppError> {
        // CONCURRENTLY cannot run inside a transaction, so no prepared statement
        let statement = format!(
            "CREATE INDEX CONCURRENTLY IF NOT EXISTS {} ON {} ({})",
            index.name,
            index.table,
            index.columns()
        );

        sqlx::raw_sql(&statement)
            .execute(&self.pool)
            .await
            .map_err(AppError::from_store)?;

        Ok(())
    }
}
