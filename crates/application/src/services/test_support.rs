//! 服务层单元测试公用的内存仓储与固定时钟。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use domain::{
    ApplicationId, ApplicationStatus, Category, CategoryId, ChannelName, ChannelUrl, Listing,
    ListingApplication, ListingDraft, ListingId, ListingKind, ListingStatus, Payment,
    RepositoryError, Timestamp, User, UserId, UserRole,
};

use crate::billing::memory::MemoryBillingStore;
use crate::clock::Clock;
use crate::moderation::{ListingWrite, ModerationStore};
use crate::repository::{
    ApplicationRepository, CategoryRepository, ListingFilter, ListingRepository,
    PaymentRepository, UserRepository,
};

pub fn test_now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

pub fn make_user(balance: Decimal) -> User {
    User {
        id: UserId::from(Uuid::new_v4()),
        balance,
        role: UserRole::User,
        created_at: test_now(),
    }
}

pub fn make_category(price: Decimal) -> Category {
    Category {
        id: CategoryId::from(Uuid::new_v4()),
        name: "新闻频道".to_owned(),
        price,
    }
}

pub fn make_draft(name: &str) -> ListingDraft {
    ListingDraft {
        kind: ListingKind::Channel { username: None },
        name: ChannelName::parse(name).unwrap(),
        url: ChannelUrl::parse(format!("https://t.me/{name}")).unwrap(),
        description: None,
        image: None,
    }
}

pub fn make_listing(owner_id: UserId, category_id: CategoryId) -> Listing {
    Listing {
        id: ListingId::from(Uuid::new_v4()),
        owner_id,
        category_id,
        kind: ListingKind::Channel { username: None },
        name: ChannelName::parse("testchannel").unwrap(),
        url: ChannelUrl::parse("https://t.me/testchannel").unwrap(),
        description: None,
        image: None,
        status: ListingStatus::Approved,
        is_top_promoted: false,
        top_promoted_at: None,
        top_promotion_expiry: None,
        is_ultra_top_promoted: false,
        ultra_top_promotion_expiry: None,
        created_at: test_now(),
        view_count: 0,
        rating: 0,
    }
}

pub fn make_payment(user_id: UserId, amount: Decimal, invoice: &str) -> Payment {
    Payment::new(
        domain::PaymentId::from(Uuid::new_v4()),
        user_id,
        amount,
        invoice.to_owned(),
        test_now(),
    )
}

#[derive(Default)]
pub struct InMemoryListingRepository {
    listings: Mutex<HashMap<ListingId, Listing>>,
}

impl InMemoryListingRepository {
    pub fn insert(&self, listing: Listing) {
        self.listings.lock().unwrap().insert(listing.id, listing);
    }

    pub fn get(&self, id: ListingId) -> Option<Listing> {
        self.listings.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn create(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        let mut listings = self.listings.lock().unwrap();
        if listings.contains_key(&listing.id) {
            return Err(RepositoryError::Conflict);
        }
        listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn update(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        let mut listings = self.listings.lock().unwrap();
        if !listings.contains_key(&listing.id) {
            return Err(RepositoryError::NotFound);
        }
        listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        Ok(self.listings.lock().unwrap().get(&id).cloned())
    }

    async fn list_approved(&self, filter: ListingFilter) -> Result<Vec<Listing>, RepositoryError> {
        Ok(self
            .listings
            .lock()
            .unwrap()
            .values()
            .filter(|listing| listing.status == ListingStatus::Approved)
            .filter(|listing| {
                filter
                    .category_id
                    .map(|category| listing.category_id == category)
                    .unwrap_or(true)
            })
            .filter(|listing| {
                filter
                    .kind
                    .map(|kind| listing.kind.tag() == kind)
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn increment_views(&self, id: ListingId) -> Result<(), RepositoryError> {
        let mut listings = self.listings.lock().unwrap();
        let listing = listings.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        listing.view_count += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    categories: Mutex<HashMap<CategoryId, Category>>,
}

impl InMemoryCategoryRepository {
    pub fn insert(&self, category: Category) {
        self.categories
            .lock()
            .unwrap()
            .insert(category.id, category);
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.categories.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.categories.lock().unwrap().values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryApplicationRepository {
    applications: Mutex<HashMap<ApplicationId, ListingApplication>>,
}

impl InMemoryApplicationRepository {
    pub fn insert(&self, application: ListingApplication) {
        self.applications
            .lock()
            .unwrap()
            .insert(application.id, application);
    }

    pub fn get(&self, id: ApplicationId) -> Option<ListingApplication> {
        self.applications.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ListingApplication>, RepositoryError> {
        Ok(self.applications.lock().unwrap().get(&id).cloned())
    }

    async fn list_pending(&self) -> Result<Vec<ListingApplication>, RepositoryError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .values()
            .filter(|application| application.status == ApplicationStatus::Pending)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        application: ListingApplication,
    ) -> Result<ListingApplication, RepositoryError> {
        let mut applications = self.applications.lock().unwrap();
        if !applications.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        applications.insert(application.id, application.clone());
        Ok(application)
    }
}

#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: Mutex<HashMap<String, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn get(&self, invoice: &str) -> Option<Payment> {
        self.payments.lock().unwrap().get(invoice).cloned()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let mut payments = self.payments.lock().unwrap();
        if payments.contains_key(&payment.external_invoice_id) {
            return Err(RepositoryError::Conflict);
        }
        payments.insert(payment.external_invoice_id.clone(), payment.clone());
        Ok(payment)
    }

    async fn find_by_invoice(
        &self,
        external_invoice_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .get(external_invoice_id)
            .cloned())
    }
}

/// 内存版审核存储，写入前先判定失败，保证要么全写要么全不写。
pub struct InMemoryModerationStore {
    applications: Arc<InMemoryApplicationRepository>,
    listings: Arc<InMemoryListingRepository>,
    fail_next: AtomicBool,
}

impl InMemoryModerationStore {
    pub fn new(
        applications: Arc<InMemoryApplicationRepository>,
        listings: Arc<InMemoryListingRepository>,
    ) -> Self {
        Self {
            applications,
            listings,
            fail_next: AtomicBool::new(false),
        }
    }

    /// 让下一次落库整体失败，模拟事务回滚。
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModerationStore for InMemoryModerationStore {
    async fn store_approval(
        &self,
        application: ListingApplication,
        listing: ListingWrite,
    ) -> Result<ListingApplication, crate::error::ApplicationError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::storage("store unavailable").into());
        }
        match listing {
            ListingWrite::Create(listing) => {
                self.listings.create(listing).await?;
            }
            ListingWrite::Update(listing) => {
                self.listings.update(listing).await?;
            }
        }
        Ok(self.applications.update(application).await?)
    }
}

/// 账户读取直接透传计费存储，保证测试里余额只有一份真相。
pub struct StoreBackedUserRepository {
    store: Arc<MemoryBillingStore>,
}

impl StoreBackedUserRepository {
    pub fn new(store: Arc<MemoryBillingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for StoreBackedUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.store.user(id))
    }
}
