use std::collections::BTreeSet;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    features::listings::{
        predicate::{Predicate, SearchScope, build_predicate},
        repository::ListingStore,
        schemas::RawSearchRequest,
        validation::validate,
    },
    utilities::errors::AppError,
};

pub const LISTINGS_TABLE: &str = "listings";
pub const LISTING_AMENITIES_TABLE: &str = "listing_amenities";

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum IndexField {
    Status,
    Price,
    Bedrooms,
    Bathrooms,
    PropertyType,
    OwnerId,
    CreatedAt,
    Id,
    Amenity,
    ListingId,
}

impl IndexField {
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Price => "price",
            Self::Bedrooms => "bedrooms",
            Self::Bathrooms => "bathrooms",
            Self::PropertyType => "property_type",
            Self::OwnerId => "owner_id",
            Self::CreatedAt => "created_at",
            Self::Id => "id",
            Self::Amenity => "amenity",
            Self::ListingId => "listing_id",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IndexShape {
    pub name: &'static str,
    pub table: &'static str,
    pub fields: &'static [IndexField],
}

impl IndexShape {
    /// An index covers a predicate shape when its leading column is
    /// constrained by the predicate and every constrained column is part of
    /// the index.
    pub fn covers(&self, shape: &[IndexField]) -> bool {
        let Some(leading) = self.fields.first() else {
            return false;
        };

        self.table == LISTINGS_TABLE
            && shape.contains(leading)
            && shape.iter().all(|field| self.fields.contains(field))
    }

    pub fn columns(&self) -> String {
        self.fields
            .iter()
            .map(IndexField::column)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub const REQUIRED_INDEXES: &[IndexShape] = &[
    IndexShape {
        name: "listings_status_price_bedrooms_idx",
        table: LISTINGS_TABLE,
        fields: &[IndexField::Status, IndexField::Price, IndexField::Bedrooms],
    },
    IndexShape {
        name: "listings_status_price_bathrooms_idx",
        table: LISTINGS_TABLE,
        fields: &[IndexField::Status, IndexField::Price, IndexField::Bathrooms],
    },
    IndexShape {
        name: "listings_status_bedrooms_bathrooms_idx",
        table: LISTINGS_TABLE,
        fields: &[IndexField::Status, IndexField::Bedrooms, IndexField::Bathrooms],
    },
    IndexShape {
        name: "listings_status_price_bedrooms_bathrooms_idx",
        table: LISTINGS_TABLE,
        fields: &[
            IndexField::Status,
            IndexField::Price,
            IndexField::Bedrooms,
            IndexField::Bathrooms,
        ],
    },
    IndexShape {
        name: "listings_owner_id_idx",
        table: LISTINGS_TABLE,
        fields: &[IndexField::OwnerId],
    },
    IndexShape {
        name: "listings_status_property_type_price_rooms_idx",
        table: LISTINGS_TABLE,
        fields: &[
            IndexField::Status,
            IndexField::PropertyType,
            IndexField::Price,
            IndexField::Bedrooms,
            IndexField::Bathrooms,
        ],
    },
    // serves the newest-first ordering
    IndexShape {
        name: "listings_status_created_at_id_idx",
        table: LISTINGS_TABLE,
        fields: &[IndexField::Status, IndexField::CreatedAt, IndexField::Id],
    },
    IndexShape {
        name: "listing_amenities_amenity_listing_id_idx",
        table: LISTING_AMENITIES_TABLE,
        fields: &[IndexField::Amenity, IndexField::ListingId],
    },
];

pub fn covering_index(shape: &[IndexField]) -> Option<&'static IndexShape> {
    REQUIRED_INDEXES.iter().find(|index| index.covers(shape))
}

/// A representative value for every field the predicate builder turns into
/// a term.
const SAMPLE_FIELDS: &[(&str, &str)] = &[
    ("minPrice", "500"),
    ("maxPrice", "1500"),
    ("bedrooms", "2"),
    ("bathrooms", "1"),
    ("propertyType", "apartment"),
    ("amenities", "wifi"),
    ("search", "campus"),
    ("status", "rented"),
];

/// Every index shape the predicate builder can emit, collected by running it
/// over each combination of fields in both scopes.
pub fn predicate_shapes() -> Vec<Vec<IndexField>> {
    let mut shapes = BTreeSet::new();

    for scope in [SearchScope::Public, SearchScope::Owner(Uuid::nil())] {
        for mask in 0..(1u32 << SAMPLE_FIELDS.len()) {
            let raw = SAMPLE_FIELDS
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .fold(RawSearchRequest::new(), |raw, (_, (key, value))| {
                    raw.with(key, value)
                });

            if let Predicate::Match(conditions) = build_predicate(&validate(&raw), scope) {
                let mut fields = conditions.index_fields();
                fields.sort();
                shapes.insert(fields);
            }
        }
    }

    shapes.into_iter().collect()
}

/// Shapes with no covering index. Such searches still return correct
/// results, they just scan.
pub fn uncovered_shapes() -> Vec<BTreeSet<IndexField>> {
    predicate_shapes()
        .into_iter()
        .filter(|shape| covering_index(shape).is_none())
        .map(|shape| shape.into_iter().collect())
        .collect()
}

/// Makes sure every required index exists and reports predicate shapes that
/// would fall back to a full scan. Runs at deploy time, never per request.
pub async fn provision_indexes(store: &dyn ListingStore) -> Result<(), AppError> {
    for index in REQUIRED_INDEXES {
        info!(
            "Ensuring index {} on {}({})",
            index.name,
            index.table,
            index.columns()
        );
        store.ensure_index(index).await?;
    }

    let uncovered = uncovered_shapes();
    for shape in &uncovered {
        warn!("No index covers predicate shape {:?}", shape);
    }

    info!(
        "Provisioned {} indexes, {} uncovered predicate shapes",
        REQUIRED_INDEXES.len(),
        uncovered.len()
    );

    Ok(())
}
