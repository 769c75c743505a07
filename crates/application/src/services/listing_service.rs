use std::sync::Arc;

use uuid::Uuid;

use domain::{rank_listings, CategoryId, DomainError, ListingId, ListingKindTag};

use crate::{
    clock::Clock,
    dto::{CategoryDto, ListingDto},
    error::ApplicationError,
    repository::{CategoryRepository, ListingFilter, ListingRepository},
};

/// 目录浏览的查询参数。
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub category_id: Option<Uuid>,
    pub kind: Option<ListingKindTag>,
}

pub struct ListingServiceDependencies {
    pub listing_repository: Arc<dyn ListingRepository>,
    pub category_repository: Arc<dyn CategoryRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct ListingService {
    deps: ListingServiceDependencies,
}

impl ListingService {
    pub fn new(deps: ListingServiceDependencies) -> Self {
        Self { deps }
    }

    /// 已上架条目的展示列表：超级置顶 > 置顶 > 按创建时间倒序。
    pub async fn list(&self, query: ListingQuery) -> Result<Vec<ListingDto>, ApplicationError> {
        let filter = ListingFilter {
            category_id: query.category_id.map(CategoryId::from),
            kind: query.kind,
        };
        let mut listings = self.deps.listing_repository.list_approved(filter).await?;

        let now = self.deps.clock.now();
        rank_listings(&mut listings, now);

        Ok(listings
            .iter()
            .map(|listing| ListingDto::from_listing(listing, now))
            .collect())
    }

    /// 单条查看，顺带累加浏览计数。
    pub async fn get(&self, id: Uuid) -> Result<ListingDto, ApplicationError> {
        let listing_id = ListingId::from(id);
        let mut listing = self
            .deps
            .listing_repository
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| DomainError::resource_not_found("listing", listing_id.to_string()))?;

        self.deps
            .listing_repository
            .increment_views(listing_id)
            .await?;
        listing.view_count += 1;

        Ok(ListingDto::from_listing(&listing, self.deps.clock.now()))
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryDto>, ApplicationError> {
        let categories = self.deps.category_repository.list().await?;
        Ok(categories.iter().map(CategoryDto::from).collect())
    }
}
