use std::{fmt, str::FromStr};

use bigdecimal::BigDecimal;
use regex::{Regex, RegexBuilder};
use tracing::warn;
use uuid::Uuid;

use crate::{
    features::listings::{
        indexes::IndexField,
        models::{ListingJoined, ListingStatus},
        validation::{Bound, ValidatedFilter},
    },
    utilities::errors::AppError,
};

/// Who is searching. Public searches only ever see active listings, owner
/// searches see every listing of that owner whatever its status.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SearchScope {
    Public,
    Owner(Uuid),
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Owner(id) => write!(f, "owner:{id}"),
        }
    }
}

/// Textual form of a scope, `public` or `owner:<uuid>`, for callers that
/// carry the scope as an opaque tag (job payloads, cache keys, logs) instead
/// of the typed value. The HTTP handlers build the scope directly. Anything
/// else is a contract violation, never a silent fallback to public.
impl FromStr for SearchScope {
    type Err = AppError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.split_once(':') {
            None if tag == "public" => Ok(Self::Public),
            Some(("owner", id)) => Uuid::parse_str(id)
                .map(Self::Owner)
                .map_err(|e| AppError::InvalidScopeError(format!("bad owner id '{id}', {e}"))),
            _ => Err(AppError::InvalidScopeError(format!(
                "expected 'public' or 'owner:<id>', found '{tag}'"
            ))),
        }
    }
}

/// Case-insensitive literal text match. The pattern is already escaped, so
/// the compiled regex matches the caller's term verbatim.
#[derive(Clone, Debug)]
pub struct TextPattern {
    pattern: String,
    regex: Regex,
}

impl TextPattern {
    fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Term {
    Status(ListingStatus),
    Owner(Uuid),
    PriceRange {
        min: Option<BigDecimal>,
        max: Option<BigDecimal>,
    },
    Bedrooms(i32),
    Bathrooms(BigDecimal),
    PropertyType(String),
    /// Matches when the listing has at least one of these amenities.
    AmenitiesAny(Vec<String>),
    /// Matches title OR description OR address.
    Text(TextPattern),
}

/// An immutable conjunction of terms. The first term is always the scope
/// term.
#[derive(Clone, PartialEq, Debug)]
pub struct Conditions {
    terms: Vec<Term>,
}

impl Conditions {
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn matches(&self, listing: &ListingJoined) -> bool {
        self.terms.iter().all(|term| match term {
            Term::Status(status) => listing.status == *status,
            Term::Owner(owner_id) => listing.owner_id == *owner_id,
            Term::PriceRange { min, max } => {
                min.as_ref().is_none_or(|min| listing.price >= *min)
                    && max.as_ref().is_none_or(|max| listing.price <= *max)
            }
            Term::Bedrooms(bedrooms) => listing.bedrooms == *bedrooms,
            Term::Bathrooms(bathrooms) => listing.bathrooms == *bathrooms,
            Term::PropertyType(property_type) => listing.property_type == *property_type,
            Term::AmenitiesAny(amenities) => listing
                .amenity_names()
                .iter()
                .any(|amenity| amenities.contains(amenity)),
            Term::Text(pattern) => {
                pattern.is_match(&listing.title)
                    || pattern.is_match(&listing.description)
                    || pattern.is_match(&listing.address)
            }
        })
    }

    /// Equality and range fields a B-tree index can serve. Owner searches are
    /// narrowed by `owner_id` alone, everything else is filtered from the
    /// owner's rows.
    pub fn index_fields(&self) -> Vec<IndexField> {
        if self.terms.iter().any(|term| matches!(term, Term::Owner(_))) {
            return vec![IndexField::OwnerId];
        }

        self.terms
            .iter()
            .filter_map(|term| match term {
                Term::Status(_) => Some(IndexField::Status),
                Term::PriceRange { .. } => Some(IndexField::Price),
                Term::Bedrooms(_) => Some(IndexField::Bedrooms),
                Term::Bathrooms(_) => Some(IndexField::Bathrooms),
                Term::PropertyType(_) => Some(IndexField::PropertyType),
                Term::Owner(_) | Term::AmenitiesAny(_) | Term::Text(_) => None,
            })
            .collect()
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Predicate {
    /// Matches nothing. Resolved without a store round-trip.
    Empty,
    Match(Conditions),
}

impl Predicate {
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

pub fn build_predicate(filter: &ValidatedFilter, scope: SearchScope) -> Predicate {
    let mut terms = match scope {
        SearchScope::Public => vec![Term::Status(ListingStatus::Active)],
        SearchScope::Owner(owner_id) => {
            let mut terms = vec![Term::Owner(owner_id)];
            if let Some(status) = filter.status {
                terms.push(Term::Status(status));
            }
            terms
        }
    };

    if filter.has_exceeded_bound() {
        return Predicate::Empty;
    }

    let min_price = filter.min_price.as_ref().and_then(Bound::value).cloned();
    let max_price = filter.max_price.as_ref().and_then(Bound::value).cloned();

    if let (Some(min), Some(max)) = (&min_price, &max_price)
        && min > max
    {
        return Predicate::Empty;
    }

    if min_price.is_some() || max_price.is_some() {
        terms.push(Term::PriceRange {
            min: min_price,
            max: max_price,
        });
    }

    if let Some(bedrooms) = filter.bedrooms {
        terms.push(Term::Bedrooms(bedrooms));
    }

    if let Some(bathrooms) = filter.bathrooms.as_ref().and_then(Bound::value) {
        terms.push(Term::Bathrooms(bathrooms.clone()));
    }

    if let Some(property_type) = &filter.property_type {
        terms.push(Term::PropertyType(property_type.clone()));
    }

    if let Some(amenities) = &filter.amenities {
        terms.push(Term::AmenitiesAny(amenities.iter().cloned().collect()));
    }

    if let Some(search_term) = &filter.search_term {
        match TextPattern::new(search_term) {
            Ok(pattern) => terms.push(Term::Text(pattern)),
            Err(e) => {
                warn!("Escaped search term failed to compile, matching nothing: {}", e);
                return Predicate::Empty;
            }
        }
    }

    Predicate::Match(Conditions { terms })
}
