use std::sync::Arc;

use chrono::Duration;
use rust_decimal_macros::dec;
use uuid::Uuid;

use domain::{DomainError, ListingKind, ListingKindTag, ListingStatus};

use crate::error::ApplicationError;

use super::listing_service::{ListingQuery, ListingService, ListingServiceDependencies};
use super::test_support::{
    make_category, make_listing, make_user, test_now, FixedClock, InMemoryCategoryRepository,
    InMemoryListingRepository,
};

struct Harness {
    service: ListingService,
    listings: Arc<InMemoryListingRepository>,
    categories: Arc<InMemoryCategoryRepository>,
}

fn harness() -> Harness {
    let listings = Arc::new(InMemoryListingRepository::default());
    let categories = Arc::new(InMemoryCategoryRepository::default());
    let service = ListingService::new(ListingServiceDependencies {
        listing_repository: listings.clone(),
        category_repository: categories.clone(),
        clock: Arc::new(FixedClock(test_now())),
    });
    Harness {
        service,
        listings,
        categories,
    }
}

#[tokio::test]
async fn test_list_orders_ultra_top_then_top_then_recency() {
    let h = harness();
    let owner = make_user(dec!(0));
    let category = make_category(dec!(30));

    let mut regular_old = make_listing(owner.id, category.id);
    regular_old.created_at = test_now() - Duration::days(10);
    let mut regular_new = make_listing(owner.id, category.id);
    regular_new.created_at = test_now() - Duration::days(1);
    let mut top = make_listing(owner.id, category.id);
    top.grant_top(test_now() - Duration::days(2), test_now() + Duration::days(5));
    let mut ultra = make_listing(owner.id, category.id);
    ultra.grant_ultra_top(test_now() + Duration::days(1));

    for listing in [&regular_old, &regular_new, &top, &ultra] {
        h.listings.insert((*listing).clone());
    }

    let listed = h.service.list(ListingQuery::default()).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|dto| dto.id).collect();
    assert_eq!(
        ids,
        vec![
            Uuid::from(ultra.id),
            Uuid::from(top.id),
            Uuid::from(regular_new.id),
            Uuid::from(regular_old.id),
        ]
    );
}

#[tokio::test]
async fn test_list_excludes_non_approved_listings() {
    let h = harness();
    let owner = make_user(dec!(0));
    let category = make_category(dec!(30));

    let approved = make_listing(owner.id, category.id);
    let mut pending = make_listing(owner.id, category.id);
    pending.status = ListingStatus::Pending;
    h.listings.insert(approved.clone());
    h.listings.insert(pending);

    let listed = h.service.list(ListingQuery::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, Uuid::from(approved.id));
}

#[tokio::test]
async fn test_list_filters_by_category_and_kind() {
    let h = harness();
    let owner = make_user(dec!(0));
    let news = make_category(dec!(30));
    let tech = make_category(dec!(30));

    let channel = make_listing(owner.id, news.id);
    let mut bot = make_listing(owner.id, tech.id);
    bot.kind = ListingKind::Bot { inline: true };
    h.listings.insert(channel.clone());
    h.listings.insert(bot.clone());

    let by_category = h
        .service
        .list(ListingQuery {
            category_id: Some(news.id.into()),
            kind: None,
        })
        .await
        .unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].id, Uuid::from(channel.id));

    let by_kind = h
        .service
        .list(ListingQuery {
            category_id: None,
            kind: Some(ListingKindTag::Bot),
        })
        .await
        .unwrap();
    assert_eq!(by_kind.len(), 1);
    assert_eq!(by_kind[0].id, Uuid::from(bot.id));
}

#[tokio::test]
async fn test_get_increments_view_count() {
    let h = harness();
    let owner = make_user(dec!(0));
    let listing = make_listing(owner.id, make_category(dec!(30)).id);
    h.listings.insert(listing.clone());

    let first = h.service.get(listing.id.into()).await.unwrap();
    assert_eq!(first.view_count, 1);
    let second = h.service.get(listing.id.into()).await.unwrap();
    assert_eq!(second.view_count, 2);
    assert_eq!(h.listings.get(listing.id).unwrap().view_count, 2);
}

#[tokio::test]
async fn test_get_unknown_listing_is_not_found() {
    let h = harness();
    let err = h.service.get(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::ResourceNotFound { .. })
    ));
}

#[tokio::test]
async fn test_list_categories_returns_all() {
    let h = harness();
    h.categories.insert(make_category(dec!(30)));
    h.categories.insert(make_category(dec!(50)));

    let categories = h.service.list_categories().await.unwrap();
    assert_eq!(categories.len(), 2);
}
