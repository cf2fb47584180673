use std::{fmt, str::FromStr};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type, types::Json};
use uuid::Uuid;

#[derive(Type, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, Debug)]
#[serde(rename_all = "camelCase")]
#[sqlx(type_name = "listing_status", rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Inactive,
    Rented,
}

impl ListingStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Rented => "rented",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "rented" => Ok(Self::Rented),
            _ => Err(()),
        }
    }
}

/// A listing row joined with its owner's display fields and amenity names,
/// exactly as the store hands it back. The owner's credentials are never part
/// of the row.
#[derive(FromRow, Clone, PartialEq, Debug)]
pub struct ListingJoined {
    pub listing_id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub price: BigDecimal,
    pub bedrooms: i32,
    pub bathrooms: BigDecimal,
    pub square_feet: Option<i32>,
    pub property_type: String,
    pub status: ListingStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub listing_created_at: DateTime<Utc>,
    pub listing_updated_at: DateTime<Utc>,

    // owner
    pub owner_id: Uuid,
    pub owner_full_name: String,
    pub owner_email: String,

    // arrays
    pub amenities: Option<Json<Vec<String>>>,
}

impl ListingJoined {
    pub fn amenity_names(&self) -> &[String] {
        self.amenities.as_ref().map(|a| a.0.as_slice()).unwrap_or_default()
    }
}
