use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::listing::{Listing, ListingKind, ListingStatus};
use crate::value_objects::{
    ApplicationId, CategoryId, ChannelName, ChannelUrl, ListingId, Timestamp, UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// 申请中携带的条目内容，审核通过后落地为 Listing。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub kind: ListingKind,
    pub name: ChannelName,
    pub url: ChannelUrl,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// 上架申请。创建后只改状态，从不删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingApplication {
    pub id: ApplicationId,
    pub applicant_id: UserId,
    pub category_id: CategoryId,
    pub price: Decimal,
    pub draft: ListingDraft,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    /// 编辑已上架条目时指向该条目；新增申请为 None。
    pub edit_of: Option<ListingId>,
    pub created_at: Timestamp,
}

impl ListingApplication {
    /// 付费的新增申请，价格来自分类。
    pub fn new_paid(
        id: ApplicationId,
        applicant_id: UserId,
        category_id: CategoryId,
        price: Decimal,
        draft: ListingDraft,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            applicant_id,
            category_id,
            price,
            draft,
            status: ApplicationStatus::Pending,
            rejection_reason: None,
            edit_of: None,
            created_at: now,
        }
    }

    /// 对已通过条目的编辑重提，价格为零，不走余额闸门。
    pub fn new_free_edit(
        id: ApplicationId,
        applicant_id: UserId,
        category_id: CategoryId,
        draft: ListingDraft,
        edit_of: ListingId,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            applicant_id,
            category_id,
            price: Decimal::ZERO,
            draft,
            status: ApplicationStatus::Pending,
            rejection_reason: None,
            edit_of: Some(edit_of),
            created_at: now,
        }
    }

    pub fn approve(&mut self) -> DomainResult<()> {
        if self.status != ApplicationStatus::Pending {
            return Err(DomainError::business_rule_violation(
                "only pending applications can be approved",
            ));
        }
        self.status = ApplicationStatus::Approved;
        Ok(())
    }

    pub fn reject(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        if self.status != ApplicationStatus::Pending {
            return Err(DomainError::business_rule_violation(
                "only pending applications can be rejected",
            ));
        }
        self.status = ApplicationStatus::Rejected;
        self.rejection_reason = Some(reason.into());
        Ok(())
    }

    /// 新增申请通过后生成的已上架条目。
    pub fn into_listing(&self, listing_id: ListingId, now: Timestamp) -> Listing {
        Listing {
            id: listing_id,
            owner_id: self.applicant_id,
            category_id: self.category_id,
            kind: self.draft.kind.clone(),
            name: self.draft.name.clone(),
            url: self.draft.url.clone(),
            description: self.draft.description.clone(),
            image: self.draft.image.clone(),
            status: ListingStatus::Approved,
            is_top_promoted: false,
            top_promoted_at: None,
            top_promotion_expiry: None,
            is_ultra_top_promoted: false,
            ultra_top_promotion_expiry: None,
            created_at: now,
            view_count: 0,
            rating: 0,
        }
    }

    /// 编辑申请通过后套用到既有条目，推广状态与计数保持不变。
    pub fn apply_edit(&self, listing: &mut Listing) {
        listing.kind = self.draft.kind.clone();
        listing.name = self.draft.name.clone();
        listing.url = self.draft.url.clone();
        listing.description = self.draft.description.clone();
        listing.image = self.draft.image.clone();
    }
}
