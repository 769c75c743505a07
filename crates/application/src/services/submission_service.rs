use std::sync::Arc;

use uuid::Uuid;

use domain::{
    ApplicationId, CategoryId, ChannelName, ChannelUrl, DomainError, ListingApplication,
    ListingDraft, ListingId, ListingKind, ListingStatus, UserId,
};

use crate::{
    billing::BillingStore,
    clock::Clock,
    dto::ApplicationDto,
    error::ApplicationError,
    repository::{CategoryRepository, ListingRepository},
};

#[derive(Debug, Clone)]
pub struct SubmitApplicationRequest {
    pub applicant_id: Uuid,
    pub category_id: Uuid,
    pub kind: ListingKind,
    pub channel_name: String,
    pub channel_url: String,
    pub description: Option<String>,
    pub channel_image: Option<String>,
    /// 编辑已上架条目时填该条目 ID，走零价分支
    pub edit_of: Option<Uuid>,
}

pub struct SubmissionServiceDependencies {
    pub category_repository: Arc<dyn CategoryRepository>,
    pub listing_repository: Arc<dyn ListingRepository>,
    pub billing: Arc<dyn BillingStore>,
    pub clock: Arc<dyn Clock>,
}

/// 上架申请入口：先验证，再过余额闸门，扣费与建申请在一个原子单元内。
pub struct SubmissionService {
    deps: SubmissionServiceDependencies,
}

impl SubmissionService {
    pub fn new(deps: SubmissionServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn submit(
        &self,
        request: SubmitApplicationRequest,
    ) -> Result<ApplicationDto, ApplicationError> {
        // 验证在任何副作用之前
        let name = ChannelName::parse(request.channel_name)?;
        let url = ChannelUrl::parse(request.channel_url)?;
        let draft = ListingDraft {
            kind: request.kind,
            name,
            url,
            description: request.description,
            image: request.channel_image,
        };

        let applicant_id = UserId::from(request.applicant_id);
        let category_id = CategoryId::from(request.category_id);
        let now = self.deps.clock.now();

        // 已上架条目的编辑重提是零价分支，不过余额闸门
        if let Some(edit_of) = request.edit_of {
            return self
                .submit_free_edit(applicant_id, category_id, draft, edit_of, now)
                .await;
        }

        let category = self
            .deps
            .category_repository
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| DomainError::resource_not_found("category", category_id.to_string()))?;

        let application = ListingApplication::new_paid(
            ApplicationId::from(Uuid::new_v4()),
            applicant_id,
            category_id,
            category.price,
            draft,
            now,
        );

        let stored = self
            .deps
            .billing
            .charge_and_create_application(application)
            .await?;

        tracing::info!(
            application_id = %stored.id,
            applicant_id = %stored.applicant_id,
            price = %stored.price,
            "charged submission fee and created pending application"
        );
        Ok(ApplicationDto::from(&stored))
    }

    async fn submit_free_edit(
        &self,
        applicant_id: UserId,
        category_id: CategoryId,
        draft: ListingDraft,
        edit_of: Uuid,
        now: domain::Timestamp,
    ) -> Result<ApplicationDto, ApplicationError> {
        let listing_id = ListingId::from(edit_of);
        let listing = self
            .deps
            .listing_repository
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| DomainError::resource_not_found("listing", listing_id.to_string()))?;

        if listing.status != ListingStatus::Approved {
            return Err(DomainError::business_rule_violation(
                "only approved listings can be edited",
            )
            .into());
        }
        if listing.owner_id != applicant_id {
            return Err(DomainError::business_rule_violation(
                "only the listing owner can submit an edit",
            )
            .into());
        }

        let application = ListingApplication::new_free_edit(
            ApplicationId::from(Uuid::new_v4()),
            applicant_id,
            category_id,
            draft,
            listing_id,
            now,
        );
        let stored = self
            .deps
            .billing
            .create_free_application(application)
            .await?;

        tracing::info!(
            application_id = %stored.id,
            listing_id = %listing_id,
            "accepted free edit application"
        );
        Ok(ApplicationDto::from(&stored))
    }
}
