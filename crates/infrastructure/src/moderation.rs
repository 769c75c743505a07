//! 审核事务的 Postgres 实现。
//!
//! 通过申请的条目写入和申请状态翻转在一个事务里提交，失败即回滚，
//! 重试不会把同一份申请落地成两个条目。

use async_trait::async_trait;
use sqlx::PgPool;

use application::error::ApplicationError;
use application::moderation::{ListingWrite, ModerationStore};
use domain::ListingApplication;

use crate::repository::{insert_listing, map_sqlx_err, update_application, update_listing};

#[derive(Clone)]
pub struct PgModerationStore {
    pool: PgPool,
}

impl PgModerationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModerationStore for PgModerationStore {
    async fn store_approval(
        &self,
        application: ListingApplication,
        listing: ListingWrite,
    ) -> Result<ListingApplication, ApplicationError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        match listing {
            ListingWrite::Create(listing) => {
                insert_listing(&mut *tx, &listing)
                    .await
                    .map_err(map_sqlx_err)?;
            }
            ListingWrite::Update(listing) => {
                update_listing(&mut *tx, &listing)
                    .await
                    .map_err(map_sqlx_err)?;
            }
        }
        let record = update_application(&mut *tx, &application)
            .await
            .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(ListingApplication::try_from(record)?)
    }
}
