use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;
use uuid::Uuid;

use domain::{DomainError, ListingId, ListingStatus, PromotionTier, UserId};

use crate::{
    billing::{BillingStore, PromotionGrant},
    clock::Clock,
    dto::ListingDto,
    error::ApplicationError,
    repository::ListingRepository,
};

/// 推广定价，由配置注入。
#[derive(Debug, Clone)]
pub struct PromotionPricing {
    pub top_price: Decimal,
    pub top_duration_days: u32,
    pub ultra_top_price_per_day: Decimal,
}

pub struct PromotionServiceDependencies {
    pub listing_repository: Arc<dyn ListingRepository>,
    pub billing: Arc<dyn BillingStore>,
    pub clock: Arc<dyn Clock>,
    pub pricing: PromotionPricing,
}

/// 付费推广：余额闸门与提交申请同构，扣费和写推广状态在一个原子单元内。
pub struct PromotionService {
    deps: PromotionServiceDependencies,
}

impl PromotionService {
    pub fn new(deps: PromotionServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn promote_top(
        &self,
        listing_id: Uuid,
        user_id: Uuid,
    ) -> Result<ListingDto, ApplicationError> {
        let listing_id = ListingId::from(listing_id);
        self.ensure_promotable(listing_id).await?;

        let now = self.deps.clock.now();
        let grant = PromotionGrant {
            listing_id,
            tier: PromotionTier::Top,
            granted_at: now,
            expires_at: now + Duration::days(i64::from(self.deps.pricing.top_duration_days)),
        };
        let listing = self
            .deps
            .billing
            .charge_and_promote(UserId::from(user_id), self.deps.pricing.top_price, grant)
            .await?;

        tracing::info!(
            listing_id = %listing_id,
            price = %self.deps.pricing.top_price,
            expires_at = %grant.expires_at,
            "granted top promotion"
        );
        Ok(ListingDto::from_listing(&listing, now))
    }

    pub async fn promote_ultra_top(
        &self,
        listing_id: Uuid,
        user_id: Uuid,
        duration_days: u32,
    ) -> Result<ListingDto, ApplicationError> {
        if duration_days == 0 || duration_days > 90 {
            return Err(
                DomainError::validation("duration_days", "must be between 1 and 90").into(),
            );
        }

        let listing_id = ListingId::from(listing_id);
        self.ensure_promotable(listing_id).await?;

        let price = self.deps.pricing.ultra_top_price_per_day * Decimal::from(duration_days);
        let now = self.deps.clock.now();
        let grant = PromotionGrant {
            listing_id,
            tier: PromotionTier::UltraTop,
            granted_at: now,
            expires_at: now + Duration::days(i64::from(duration_days)),
        };
        let listing = self
            .deps
            .billing
            .charge_and_promote(UserId::from(user_id), price, grant)
            .await?;

        tracing::info!(
            listing_id = %listing_id,
            price = %price,
            duration_days,
            "granted ultra-top promotion"
        );
        Ok(ListingDto::from_listing(&listing, now))
    }

    async fn ensure_promotable(&self, listing_id: ListingId) -> Result<(), ApplicationError> {
        let listing = self
            .deps
            .listing_repository
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| DomainError::resource_not_found("listing", listing_id.to_string()))?;
        if listing.status != ListingStatus::Approved {
            return Err(DomainError::business_rule_violation(
                "only approved listings can be promoted",
            )
            .into());
        }
        Ok(())
    }
}
