use std::{collections::BTreeSet, num::IntErrorKind, str::FromStr};

use bigdecimal::{BigDecimal, RoundingMode};
use tracing::debug;

use crate::features::{
    listings::{
        models::ListingStatus,
        schemas::{RawSearchRequest, RawValue},
    },
    schemas::{MAX_PAGE, Pagination},
};

pub const MAX_PRICE: i64 = 50_000;
pub const MAX_ROOMS: i64 = 20;
pub const MAX_AMENITIES: usize = 10;
pub const MAX_AMENITY_LENGTH: usize = 50;
pub const MAX_SEARCH_LENGTH: usize = 100;
pub const MAX_PROPERTY_TYPE_LENGTH: usize = 50;

/// Finer input is noise, and its scale can outgrow what the NUMERIC wire
/// encoding accepts.
const MAX_INPUT_SCALE: i64 = 20;
/// Accepted bounds are rounded to cents.
const BOUND_SCALE: i64 = 2;

/// Values browsers and JS clients send for "nothing".
const PLACEHOLDERS: [&str; 3] = ["nan", "undefined", "null"];

/// A decimal bound that parsed cleanly. `Exceeded` records that the caller
/// asked for more than the field allows, which makes the whole query
/// unsatisfiable instead of being clamped.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Bound {
    Within(BigDecimal),
    Exceeded,
}

impl Bound {
    pub fn value(&self) -> Option<&BigDecimal> {
        match self {
            Self::Within(value) => Some(value),
            Self::Exceeded => None,
        }
    }
}

/// The subset of a [`RawSearchRequest`] that survived validation. Every field
/// is independently optional, `None` means "no constraint".
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct ValidatedFilter {
    pub min_price: Option<Bound>,
    pub max_price: Option<Bound>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<Bound>,
    pub amenities: Option<BTreeSet<String>>,
    /// Already regex-escaped, safe to hand to a pattern matcher verbatim.
    pub search_term: Option<String>,
    pub property_type: Option<String>,
    pub status: Option<ListingStatus>,
    pub pagination: Pagination,
}

impl ValidatedFilter {
    pub fn has_exceeded_bound(&self) -> bool {
        [&self.min_price, &self.max_price, &self.bathrooms]
            .into_iter()
            .any(|bound| matches!(bound, Some(Bound::Exceeded)))
    }
}

/// Best-effort validation: a field that fails any check is dropped from the
/// result and never reported. Clients rely on being able to send empty or
/// placeholder values.
pub fn validate(raw: &RawSearchRequest) -> ValidatedFilter {
    let page = integer_in(raw, &["page"], 1, MAX_PAGE);
    let limit = scalar(raw, &["limit"]).and_then(saturating_integer);

    ValidatedFilter {
        min_price: decimal_in(raw, &["minPrice", "min_price"], MAX_PRICE),
        max_price: decimal_in(raw, &["maxPrice", "max_price"], MAX_PRICE),
        bedrooms: integer_in(raw, &["bedrooms"], 0, MAX_ROOMS)
            .and_then(|v| i32::try_from(v).ok()),
        bathrooms: decimal_in(raw, &["bathrooms"], MAX_ROOMS),
        amenities: amenities(raw),
        search_term: scalar(raw, &["search", "q"])
            .map(|term| regex::escape(&truncate(term, MAX_SEARCH_LENGTH))),
        property_type: scalar(raw, &["propertyType", "property_type"])
            .map(|value| truncate(value, MAX_PROPERTY_TYPE_LENGTH)),
        status: scalar(raw, &["status"]).and_then(|value| value.parse::<ListingStatus>().ok()),
        pagination: Pagination::new(page, limit),
    }
}

fn lookup<'a>(
    raw: &'a RawSearchRequest,
    keys: &[&'static str],
) -> Option<(&'static str, &'a RawValue)> {
    keys.iter().find_map(|key| raw.get(key).map(|value| (*key, value)))
}

/// A trimmed, non-empty, non-placeholder scalar free of control characters.
/// Lists and objects are discarded, never coerced.
fn scalar<'a>(raw: &'a RawSearchRequest, keys: &[&'static str]) -> Option<&'a str> {
    let (key, value) = lookup(raw, keys)?;

    match value {
        RawValue::Scalar(value) => {
            let value = value.trim();
            if value.is_empty() || is_placeholder(value) {
                None
            } else if has_control(value) {
                debug!("Discarding search parameter '{}' with control characters", key);
                None
            } else {
                Some(value)
            }
        }
        RawValue::List(_) | RawValue::Object => {
            debug!("Discarding non-scalar search parameter '{}'", key);
            None
        }
    }
}

fn has_control(value: &str) -> bool {
    value.chars().any(char::is_control)
}

fn is_placeholder(value: &str) -> bool {
    PLACEHOLDERS
        .iter()
        .any(|placeholder| value.eq_ignore_ascii_case(placeholder))
}

fn decimal_in(raw: &RawSearchRequest, keys: &[&'static str], max: i64) -> Option<Bound> {
    let value = scalar(raw, keys)?;

    let Ok(number) = BigDecimal::from_str(value) else {
        debug!("Discarding non-numeric search parameter '{}'", keys[0]);
        return None;
    };

    let (_, scale) = number.as_bigint_and_exponent();
    if scale > MAX_INPUT_SCALE {
        debug!("Discarding over-precise search parameter '{}'", keys[0]);
        return None;
    }

    if number < BigDecimal::from(0) {
        debug!("Discarding negative search parameter '{}'", keys[0]);
        return None;
    }

    // exponent notation reaches past f64, and anything that far out is above max
    if value.parse::<f64>().is_ok_and(f64::is_infinite) {
        return Some(Bound::Exceeded);
    }

    if number > BigDecimal::from(max) {
        return Some(Bound::Exceeded);
    }

    Some(Bound::Within(
        number.with_scale_round(BOUND_SCALE, RoundingMode::HalfUp),
    ))
}

fn integer_in(raw: &RawSearchRequest, keys: &[&'static str], min: i64, max: i64) -> Option<i64> {
    let value = scalar(raw, keys)?;

    match value.parse::<i64>() {
        Ok(number) if (min..=max).contains(&number) => Some(number),
        _ => {
            debug!("Discarding out of range search parameter '{}'", keys[0]);
            None
        }
    }
}

fn amenities(raw: &RawSearchRequest) -> Option<BTreeSet<String>> {
    let (_, value) = lookup(raw, &["amenities"])?;

    let entries: Vec<&str> = match value {
        RawValue::Scalar(value) => value.split(',').collect(),
        RawValue::List(values) => values.iter().flat_map(|value| value.split(',')).collect(),
        RawValue::Object => return None,
    };

    let mut amenities = BTreeSet::new();
    for entry in entries {
        if amenities.len() == MAX_AMENITIES {
            break;
        }
        let entry = entry.trim();
        if !entry.is_empty() && !is_placeholder(entry) && !has_control(entry) {
            amenities.insert(truncate(entry, MAX_AMENITY_LENGTH));
        }
    }

    (!amenities.is_empty()).then_some(amenities)
}

/// Integers too large for `i64` saturate instead of being dropped.
fn saturating_integer(value: &str) -> Option<i64> {
    match value.parse::<i64>() {
        Ok(number) => Some(number),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect::<String>().trim_end().to_string()
}
