use std::sync::Arc;

use uuid::Uuid;

use domain::{ApplicationId, DomainError, ListingId};

use crate::{
    clock::Clock,
    dto::ApplicationDto,
    error::ApplicationError,
    moderation::{ListingWrite, ModerationStore},
    repository::{ApplicationRepository, ListingRepository},
};

pub struct ModerationServiceDependencies {
    pub application_repository: Arc<dyn ApplicationRepository>,
    pub listing_repository: Arc<dyn ListingRepository>,
    pub moderation_store: Arc<dyn ModerationStore>,
    pub clock: Arc<dyn Clock>,
}

/// 审核：通过时新增申请落地为条目、编辑申请套用到既有条目；
/// 驳回时记录原因。申请记录从不删除。
/// 通过的两处写入经由 `ModerationStore` 落库，失败后重试不会留下
/// 半截状态。
pub struct ModerationService {
    deps: ModerationServiceDependencies,
}

impl ModerationService {
    pub fn new(deps: ModerationServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn list_pending(&self) -> Result<Vec<ApplicationDto>, ApplicationError> {
        let applications = self.deps.application_repository.list_pending().await?;
        Ok(applications.iter().map(ApplicationDto::from).collect())
    }

    pub async fn approve(&self, application_id: Uuid) -> Result<ApplicationDto, ApplicationError> {
        let application_id = ApplicationId::from(application_id);
        let mut application = self
            .deps
            .application_repository
            .find_by_id(application_id)
            .await?
            .ok_or_else(|| {
                DomainError::resource_not_found("application", application_id.to_string())
            })?;

        application.approve()?;

        let write = match application.edit_of {
            Some(listing_id) => {
                let mut listing = self
                    .deps
                    .listing_repository
                    .find_by_id(listing_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::resource_not_found("listing", listing_id.to_string())
                    })?;
                application.apply_edit(&mut listing);
                ListingWrite::Update(listing)
            }
            None => ListingWrite::Create(
                application.into_listing(ListingId::from(Uuid::new_v4()), self.deps.clock.now()),
            ),
        };

        let stored = self
            .deps
            .moderation_store
            .store_approval(application, write)
            .await?;
        tracing::info!(application_id = %stored.id, "approved application");
        Ok(ApplicationDto::from(&stored))
    }

    pub async fn reject(
        &self,
        application_id: Uuid,
        reason: String,
    ) -> Result<ApplicationDto, ApplicationError> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("reason", "cannot be empty").into());
        }

        let application_id = ApplicationId::from(application_id);
        let mut application = self
            .deps
            .application_repository
            .find_by_id(application_id)
            .await?
            .ok_or_else(|| {
                DomainError::resource_not_found("application", application_id.to_string())
            })?;

        application.reject(reason)?;

        let stored = self.deps.application_repository.update(application).await?;
        tracing::info!(application_id = %stored.id, "rejected application");
        Ok(ApplicationDto::from(&stored))
    }
}
