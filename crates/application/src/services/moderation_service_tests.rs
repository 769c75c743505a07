use std::sync::Arc;

use chrono::Duration;
use rust_decimal_macros::dec;
use uuid::Uuid;

use domain::{
    ApplicationId, ApplicationStatus, ChannelName, DomainError, ListingApplication, ListingStatus,
};

use crate::error::ApplicationError;
use crate::repository::ListingRepository;

use super::moderation_service::{ModerationService, ModerationServiceDependencies};
use super::test_support::{
    make_category, make_draft, make_listing, make_user, test_now, FixedClock,
    InMemoryApplicationRepository, InMemoryListingRepository, InMemoryModerationStore,
};

struct Harness {
    service: ModerationService,
    applications: Arc<InMemoryApplicationRepository>,
    listings: Arc<InMemoryListingRepository>,
    store: Arc<InMemoryModerationStore>,
}

fn harness() -> Harness {
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let listings = Arc::new(InMemoryListingRepository::default());
    let store = Arc::new(InMemoryModerationStore::new(
        applications.clone(),
        listings.clone(),
    ));
    let service = ModerationService::new(ModerationServiceDependencies {
        application_repository: applications.clone(),
        listing_repository: listings.clone(),
        moderation_store: store.clone(),
        clock: Arc::new(FixedClock(test_now())),
    });
    Harness {
        service,
        applications,
        listings,
        store,
    }
}

fn paid_application() -> ListingApplication {
    ListingApplication::new_paid(
        ApplicationId::from(Uuid::new_v4()),
        make_user(dec!(0)).id,
        make_category(dec!(30)).id,
        dec!(30),
        make_draft("rustnews"),
        test_now(),
    )
}

#[tokio::test]
async fn test_approve_new_application_creates_approved_listing() {
    let h = harness();
    let application = paid_application();
    h.applications.insert(application.clone());

    let dto = h.service.approve(application.id.into()).await.unwrap();
    assert_eq!(dto.status, ApplicationStatus::Approved);

    let listings = h
        .listings
        .list_approved(Default::default())
        .await
        .unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].status, ListingStatus::Approved);
    assert_eq!(listings[0].owner_id, application.applicant_id);
    assert_eq!(listings[0].name, application.draft.name);
}

#[tokio::test]
async fn test_approve_edit_updates_listing_in_place_preserving_promotion() {
    let h = harness();
    let owner = make_user(dec!(0));
    let mut listing = make_listing(owner.id, make_category(dec!(30)).id);
    listing.grant_top(test_now(), test_now() + Duration::days(7));
    listing.view_count = 77;
    h.listings.insert(listing.clone());

    let mut application = ListingApplication::new_free_edit(
        ApplicationId::from(Uuid::new_v4()),
        owner.id,
        listing.category_id,
        make_draft("renamedchannel"),
        listing.id,
        test_now(),
    );
    application.draft.name = ChannelName::parse("改名后的频道").unwrap();
    h.applications.insert(application.clone());

    h.service.approve(application.id.into()).await.unwrap();

    let updated = h.listings.get(listing.id).unwrap();
    assert_eq!(updated.id, listing.id);
    assert_eq!(updated.name.as_str(), "改名后的频道");
    assert!(updated.is_top_promoted);
    assert_eq!(updated.view_count, 77);
    // 编辑不会新增条目
    assert_eq!(
        h.listings.list_approved(Default::default()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_approve_is_single_shot() {
    let h = harness();
    let application = paid_application();
    h.applications.insert(application.clone());

    h.service.approve(application.id.into()).await.unwrap();
    let err = h.service.approve(application.id.into()).await.unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::BusinessRuleViolation { .. })
    ));
    // 第二次通过不会重复落地条目
    assert_eq!(
        h.listings.list_approved(Default::default()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_approve_failure_leaves_no_partial_state() {
    let h = harness();
    let application = paid_application();
    h.applications.insert(application.clone());

    // 落库失败时申请必须保持待审，也不能留下条目
    h.store.fail_next();
    h.service.approve(application.id.into()).await.unwrap_err();

    assert_eq!(
        h.applications.get(application.id).unwrap().status,
        ApplicationStatus::Pending
    );
    assert!(h
        .listings
        .list_approved(Default::default())
        .await
        .unwrap()
        .is_empty());

    // 重试成功后恰好落地一个条目
    h.service.approve(application.id.into()).await.unwrap();
    assert_eq!(
        h.listings.list_approved(Default::default()).await.unwrap().len(),
        1
    );
    assert_eq!(
        h.applications.get(application.id).unwrap().status,
        ApplicationStatus::Approved
    );
}

#[tokio::test]
async fn test_reject_stores_reason_and_creates_no_listing() {
    let h = harness();
    let application = paid_application();
    h.applications.insert(application.clone());

    let dto = h
        .service
        .reject(application.id.into(), "broken link".to_owned())
        .await
        .unwrap();

    assert_eq!(dto.status, ApplicationStatus::Rejected);
    assert_eq!(dto.rejection_reason.as_deref(), Some("broken link"));
    assert!(h
        .listings
        .list_approved(Default::default())
        .await
        .unwrap()
        .is_empty());

    let stored = h.applications.get(application.id).unwrap();
    assert_eq!(stored.status, ApplicationStatus::Rejected);
}

#[tokio::test]
async fn test_reject_requires_non_empty_reason() {
    let h = harness();
    let application = paid_application();
    h.applications.insert(application.clone());

    let err = h
        .service
        .reject(application.id.into(), "   ".to_owned())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Validation { .. })
    ));
    assert_eq!(
        h.applications.get(application.id).unwrap().status,
        ApplicationStatus::Pending
    );
}

#[tokio::test]
async fn test_list_pending_excludes_decided_applications() {
    let h = harness();
    let pending = paid_application();
    let decided = paid_application();
    h.applications.insert(pending.clone());
    h.applications.insert(decided.clone());

    h.service.approve(decided.id.into()).await.unwrap();

    let listed = h.service.list_pending().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, Uuid::from(pending.id));
}

#[tokio::test]
async fn test_approve_unknown_application_is_not_found() {
    let h = harness();
    let err = h.service.approve(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::ResourceNotFound { .. })
    ));
}
