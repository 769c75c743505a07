use async_trait::async_trait;
use domain::{
    ApplicationId, Category, CategoryId, Listing, ListingApplication, ListingId, ListingKindTag,
    Payment, RepositoryError, User, UserId,
};

/// 目录条目查询过滤条件。
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub category_id: Option<CategoryId>,
    pub kind: Option<ListingKindTag>,
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create(&self, listing: Listing) -> Result<Listing, RepositoryError>;
    async fn update(&self, listing: Listing) -> Result<Listing, RepositoryError>;
    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError>;
    async fn list_approved(&self, filter: ListingFilter) -> Result<Vec<Listing>, RepositoryError>;
    async fn increment_views(&self, id: ListingId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Category>, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ListingApplication>, RepositoryError>;
    async fn list_pending(&self) -> Result<Vec<ListingApplication>, RepositoryError>;
    async fn update(
        &self,
        application: ListingApplication,
    ) -> Result<ListingApplication, RepositoryError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment, RepositoryError>;
    async fn find_by_invoice(
        &self,
        external_invoice_id: &str,
    ) -> Result<Option<Payment>, RepositoryError>;
}
