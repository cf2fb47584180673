use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use uuid::Uuid;

use crate::features::{listings::models::ListingStatus, schemas::PaginationOut};

// -- =====================
// -- IN
// -- =====================

/// Shape of a single untrusted query value.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RawValue {
    Scalar(String),
    List(Vec<String>),
    /// The caller used bracket syntax (`minPrice[$gt]=1`) and sent a nested
    /// object. Its content is irrelevant, it is never coerced.
    Object,
}

/// Unordered, untrusted search parameters exactly as the caller sent them.
#[derive(Clone, Default, Debug)]
pub struct RawSearchRequest {
    fields: HashMap<String, RawValue>,
}

impl RawSearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query string. Repeated
    /// keys and `key[]` collect into a list, any other bracketed key marks the
    /// field as an object.
    pub fn from_query(query: &str) -> Self {
        let mut request = Self::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let bracketed = key
                .split_once('[')
                .map(|(name, rest)| (name.to_string(), rest == "]"));

            match bracketed {
                None => request.push(key.into_owned(), value.into_owned()),
                Some((name, true)) => request.push_list_item(name, value.into_owned()),
                Some((name, false)) => {
                    request.fields.insert(name, RawValue::Object);
                }
            }
        }

        request
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.push(key.to_string(), value.to_string());
        self
    }

    pub fn with_list(mut self, key: &str, values: &[&str]) -> Self {
        for value in values {
            self.push_list_item(key.to_string(), (*value).to_string());
        }
        self
    }

    pub fn with_object(mut self, key: &str) -> Self {
        self.fields.insert(key.to_string(), RawValue::Object);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn push(&mut self, key: String, value: String) {
        self.merge(key, value, RawValue::Scalar);
    }

    fn push_list_item(&mut self, key: String, value: String) {
        self.merge(key, value, |value| RawValue::List(vec![value]));
    }

    /// A second value for a known key turns it into a list. Objects absorb
    /// everything.
    fn merge(&mut self, key: String, value: String, fresh: fn(String) -> RawValue) {
        let Some(existing) = self.fields.get_mut(&key) else {
            self.fields.insert(key, fresh(value));
            return;
        };

        match existing {
            RawValue::Scalar(first) => {
                let first = std::mem::take(first);
                *existing = RawValue::List(vec![first, value]);
            }
            RawValue::List(values) => values.push(value),
            RawValue::Object => {}
        }
    }
}

// -- =====================
// -- OUT
// -- =====================
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OwnerOut {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub id: Uuid,
    pub title: String,
    pub price: BigDecimal,
    pub bedrooms: i32,
    pub bathrooms: BigDecimal,
    pub square_feet: Option<i32>,
    pub property_type: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenities: Vec<String>,
    pub status: ListingStatus,
    pub owner: OwnerOut,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ListingResponse {
    pub listings: Vec<ListingSummary>,
    pub pagination: PaginationOut,
}
