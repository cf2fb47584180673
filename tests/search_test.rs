mod common;

use std::collections::HashSet;

use common::{dec, listing};
use listing_search::{
    features::listings::{
        indexes::{REQUIRED_INDEXES, provision_indexes},
        models::{ListingJoined, ListingStatus},
        predicate::SearchScope,
        schemas::{ListingResponse, RawSearchRequest},
        search::search_listings,
    },
    services::memory_store::MemoryListingStore,
    utilities::errors::AppError,
};
use sqlx::types::Json;
use uuid::Uuid;

async fn search(store: &MemoryListingStore, query: &str) -> ListingResponse {
    search_listings(store, &RawSearchRequest::from_query(query), SearchScope::Public)
        .await
        .unwrap()
}

fn priced(prices: &[&str]) -> MemoryListingStore {
    let owner = Uuid::new_v4();
    MemoryListingStore::new(
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| ListingJoined {
                price: dec(price),
                ..listing(i as i64, owner)
            })
            .collect(),
    )
}

#[tokio::test]
async fn price_range_selects_exactly_matching_listing() {
    let store = priced(&["800", "1200", "2000"]);

    let page = search(&store, "minPrice=1000&maxPrice=1500").await;

    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.listings.len(), 1);
    assert_eq!(page.listings[0].price, dec("1200"));
}

#[tokio::test]
async fn every_listing_falls_inside_requested_range() {
    let store = priced(&["0", "450", "800", "999.99", "1000", "1500", "2500", "49999"]);

    for (min, max) in [("0", "0"), ("500", "1500"), ("1000", "1000"), ("100", "50000")] {
        let page = search(&store, &format!("minPrice={min}&maxPrice={max}&limit=100")).await;
        for summary in &page.listings {
            assert!(summary.price >= dec(min) && summary.price <= dec(max));
        }
        assert_eq!(page.pagination.total, page.listings.len() as i64);
    }
}

#[tokio::test]
async fn inverted_range_never_reaches_the_store() {
    let store = priced(&["800", "1200", "2000"]);

    let page = search(&store, "minPrice=2000&maxPrice=1000").await;

    assert!(page.listings.is_empty());
    assert_eq!(page.pagination.total, 0);
    assert_eq!(page.pagination.total_pages, 0);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn exceeded_bound_never_reaches_the_store() {
    let store = priced(&["800"]);

    let page = search(&store, "maxPrice=75000").await;

    assert!(page.listings.is_empty());
    assert_eq!(page.pagination.total, 0);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn garbage_fields_behave_like_omitted_fields() {
    let store = priced(&["800", "1200", "2000"]);
    let baseline = search(&store, "").await;

    for query in [
        "minPrice=NaN",
        "maxPrice=undefined",
        "bedrooms=null",
        "bathrooms[$gt]=0",
        "minPrice=100&minPrice=200",
        "amenities[$ne]=wifi",
        "search=",
        "amenities=null",
        "page=abc&limit=",
    ] {
        let page = search(&store, query).await;
        assert_eq!(page, baseline, "query={query}");
    }
}

#[tokio::test]
async fn bedrooms_filter_is_exact() {
    let owner = Uuid::new_v4();
    let store = MemoryListingStore::new(
        [2, 3, 4]
            .into_iter()
            .enumerate()
            .map(|(i, bedrooms)| ListingJoined {
                bedrooms,
                ..listing(i as i64, owner)
            })
            .collect(),
    );

    let page = search(&store, "bedrooms=3").await;

    assert_eq!(page.listings.len(), 1);
    assert_eq!(page.listings[0].bedrooms, 3);
}

#[tokio::test]
async fn third_page_of_twenty_five() {
    let owner = Uuid::new_v4();
    let store = MemoryListingStore::new((0..25).map(|i| listing(i, owner)).collect());

    let page = search(&store, "page=3&limit=10").await;

    assert_eq!(page.listings.len(), 5);
    assert_eq!(page.pagination.total, 25);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(!page.pagination.has_next_page);
    assert!(page.pagination.has_prev_page);
}

#[tokio::test]
async fn pages_concatenate_to_the_full_result() {
    let owner = Uuid::new_v4();
    // timestamps collide in pairs so the id tie-break decides the order
    let store = MemoryListingStore::new((0..23).map(|i| listing(i / 2, owner)).collect());

    let full = search(&store, "limit=100").await;
    assert_eq!(full.listings.len(), 23);

    let total_pages = search(&store, "limit=5").await.pagination.total_pages;
    assert_eq!(total_pages, 5);

    let mut paged = Vec::new();
    for page in 1..=total_pages + 1 {
        let result = search(&store, &format!("page={page}&limit=5")).await;
        if page > total_pages {
            assert!(result.listings.is_empty());
        }
        paged.extend(result.listings);
    }

    let ids: HashSet<Uuid> = paged.iter().map(|s| s.id).collect();
    assert_eq!(ids.len(), paged.len());
    assert_eq!(paged, full.listings);
}

#[tokio::test]
async fn newest_listings_come_first() {
    let owner = Uuid::new_v4();
    let store = MemoryListingStore::new((0..5).map(|i| listing(i, owner)).collect());

    let page = search(&store, "").await;

    let created: Vec<_> = page.listings.iter().map(|s| s.created_at).collect();
    let mut sorted = created.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(created, sorted);
}

#[tokio::test]
async fn search_term_is_matched_literally() {
    let owner = Uuid::new_v4();
    let store = MemoryListingStore::new(vec![
        ListingJoined {
            title: "Sunny 3BR (near campus)".to_string(),
            ..listing(1, owner)
        },
        ListingJoined {
            title: "Sunny 3BR near campus".to_string(),
            ..listing(2, owner)
        },
        ListingJoined {
            title: "Loft".to_string(),
            description: "a 3br (NEAR CAMPUS) loft".to_string(),
            ..listing(3, owner)
        },
    ]);

    let page = search(&store, "search=3BR+%28near+campus%29").await;

    let titles: Vec<_> = page.listings.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Loft", "Sunny 3BR (near campus)"]);
}

#[tokio::test]
async fn amenities_match_any_requested() {
    let owner = Uuid::new_v4();
    let with = |seq: i64, amenities: &[&str]| ListingJoined {
        amenities: Some(Json(amenities.iter().map(|a| a.to_string()).collect())),
        ..listing(seq, owner)
    };
    let store = MemoryListingStore::new(vec![
        with(1, &["wifi"]),
        with(2, &["parking", "gym"]),
        with(3, &["pool"]),
        with(4, &[]),
    ]);

    let page = search(&store, "amenities=wifi,parking").await;
    assert_eq!(page.pagination.total, 2);

    let page = search(&store, "amenities=gym&amenities=pool").await;
    assert_eq!(page.pagination.total, 2);
}

#[tokio::test]
async fn public_scope_only_sees_active_listings() {
    let owner = Uuid::new_v4();
    let store = MemoryListingStore::new(vec![
        listing(1, owner),
        ListingJoined {
            status: ListingStatus::Inactive,
            ..listing(2, owner)
        },
        ListingJoined {
            status: ListingStatus::Rented,
            ..listing(3, owner)
        },
    ]);

    let page = search(&store, "status=inactive").await;

    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.listings[0].status, ListingStatus::Active);
}

#[tokio::test]
async fn owner_scope_sees_every_own_listing_and_nothing_else() {
    let me = Uuid::new_v4();
    let someone_else = Uuid::new_v4();
    let store = MemoryListingStore::new(vec![
        listing(1, me),
        ListingJoined {
            status: ListingStatus::Inactive,
            ..listing(2, me)
        },
        ListingJoined {
            status: ListingStatus::Rented,
            ..listing(3, me)
        },
        listing(4, someone_else),
        ListingJoined {
            status: ListingStatus::Inactive,
            ..listing(5, someone_else)
        },
    ]);

    let page = search_listings(&store, &RawSearchRequest::new(), SearchScope::Owner(me))
        .await
        .unwrap();

    assert_eq!(page.pagination.total, 3);
    assert!(page.listings.iter().all(|s| s.owner.id == me));

    let rented = RawSearchRequest::new().with("status", "rented");
    let page = search_listings(&store, &rented, SearchScope::Owner(me))
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.listings[0].status, ListingStatus::Rented);
}

#[tokio::test]
async fn property_type_filter() {
    let owner = Uuid::new_v4();
    let store = MemoryListingStore::new(vec![
        listing(1, owner),
        ListingJoined {
            property_type: "house".to_string(),
            ..listing(2, owner)
        },
    ]);

    let page = search(&store, "propertyType=house").await;

    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.listings[0].property_type, "house");
}

#[tokio::test]
async fn summaries_expose_owner_display_fields_only() {
    let owner = Uuid::new_v4();
    let store = MemoryListingStore::new(vec![listing(1, owner)]);

    let page = search(&store, "").await;
    let json = serde_json::to_value(&page.listings[0]).unwrap();

    assert_eq!(json["owner"]["id"], owner.to_string());
    assert_eq!(json["owner"]["fullName"], "Jordan Example");
    assert_eq!(json["owner"].as_object().unwrap().len(), 3);
    assert_eq!(json["amenities"][0], "wifi");
}

#[tokio::test]
async fn store_outage_is_not_an_empty_result() {
    let store = priced(&["800"]);
    store.set_unavailable(true);

    let result = search_listings(&store, &RawSearchRequest::new(), SearchScope::Public).await;

    assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
}

#[tokio::test]
async fn provisioning_is_idempotent() {
    let store = MemoryListingStore::default();

    provision_indexes(&store).await.unwrap();
    provision_indexes(&store).await.unwrap();

    let ensured = store.ensured_indexes();
    assert_eq!(ensured.len(), REQUIRED_INDEXES.len());
    for index in REQUIRED_INDEXES {
        assert!(ensured.contains(&index.name));
    }
}

#[tokio::test]
async fn provisioning_surfaces_store_outage() {
    let store = MemoryListingStore::default();
    store.set_unavailable(true);

    let result = provision_indexes(&store).await;

    assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
}
