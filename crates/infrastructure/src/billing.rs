//! 计费事务的 Postgres 实现。
//!
//! 扣费用条件 UPDATE（`balance >= 价格` 写进 WHERE），由数据库行锁
//! 保证并发提交不会联合透支；回调入账对支付单行加 FOR UPDATE 锁，
//! 重复回调在锁内判定。每个方法恰好一个事务。

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use application::billing::{BillingStore, CreditOutcome, PromotionGrant};
use application::error::ApplicationError;
use domain::{DomainError, Listing, ListingApplication, Payment, PromotionTier, UserId};

use crate::repository::{
    insert_application, map_sqlx_err, ListingRecord, PaymentRecord, LISTING_COLUMNS,
    PAYMENT_COLUMNS,
};

#[derive(Clone)]
pub struct PgBillingStore {
    pool: PgPool,
}

impl PgBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 条件扣费。余额不足时重读余额以便报出准确的差额。
    async fn charge(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
        price: Decimal,
    ) -> Result<(), ApplicationError> {
        let result =
            sqlx::query("UPDATE users SET balance = balance - $2 WHERE id = $1 AND balance >= $2")
                .bind(Uuid::from(user_id))
                .bind(price)
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx_err)?;
        if result.rows_affected() == 1 {
            return Ok(());
        }

        let available: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM users WHERE id = $1")
                .bind(Uuid::from(user_id))
                .fetch_optional(&mut **tx)
                .await
                .map_err(map_sqlx_err)?;
        match available {
            Some(available) => Err(DomainError::insufficient_balance(price, available).into()),
            None => Err(DomainError::resource_not_found("user", user_id.to_string()).into()),
        }
    }
}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn charge_and_create_application(
        &self,
        application: ListingApplication,
    ) -> Result<ListingApplication, ApplicationError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        Self::charge(&mut tx, application.applicant_id, application.price).await?;
        let record = insert_application(&mut *tx, &application)
            .await
            .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(ListingApplication::try_from(record)?)
    }

    async fn create_free_application(
        &self,
        application: ListingApplication,
    ) -> Result<ListingApplication, ApplicationError> {
        let record = insert_application(&self.pool, &application)
            .await
            .map_err(map_sqlx_err)?;
        Ok(ListingApplication::try_from(record)?)
    }

    async fn charge_and_promote(
        &self,
        user_id: UserId,
        price: Decimal,
        grant: PromotionGrant,
    ) -> Result<Listing, ApplicationError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM listings WHERE id = $1 FOR UPDATE")
                .bind(Uuid::from(grant.listing_id))
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
        match status.as_deref() {
            None => {
                return Err(DomainError::resource_not_found(
                    "listing",
                    grant.listing_id.to_string(),
                )
                .into())
            }
            Some("approved") => {}
            Some(_) => {
                return Err(DomainError::business_rule_violation(
                    "only approved listings can be promoted",
                )
                .into())
            }
        }

        Self::charge(&mut tx, user_id, price).await?;

        let record = match grant.tier {
            PromotionTier::Top => {
                sqlx::query_as::<_, ListingRecord>(&format!(
                    r#"
                    UPDATE listings
                    SET is_top_promoted = TRUE, top_promoted_at = $2, top_promotion_expiry = $3
                    WHERE id = $1
                    RETURNING {LISTING_COLUMNS}
                    "#,
                ))
                .bind(Uuid::from(grant.listing_id))
                .bind(grant.granted_at)
                .bind(grant.expires_at)
                .fetch_one(&mut *tx)
                .await
            }
            PromotionTier::UltraTop => {
                sqlx::query_as::<_, ListingRecord>(&format!(
                    r#"
                    UPDATE listings
                    SET is_ultra_top_promoted = TRUE, ultra_top_promotion_expiry = $2
                    WHERE id = $1
                    RETURNING {LISTING_COLUMNS}
                    "#,
                ))
                .bind(Uuid::from(grant.listing_id))
                .bind(grant.expires_at)
                .fetch_one(&mut *tx)
                .await
            }
        }
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(Listing::try_from(record)?)
    }

    async fn credit_invoice(
        &self,
        external_invoice_id: &str,
        amount: Decimal,
    ) -> Result<CreditOutcome, ApplicationError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let record = sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"SELECT {PAYMENT_COLUMNS} FROM payments WHERE external_invoice_id = $1 FOR UPDATE"#,
        ))
        .bind(external_invoice_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        let payment: Payment = match record {
            Some(record) => Payment::try_from(record)?,
            None => return Err(DomainError::unknown_invoice(external_invoice_id).into()),
        };
        if payment.amount != amount {
            return Err(DomainError::validation("amount", "does not match invoice amount").into());
        }
        if payment.result_processed {
            // 网关重放，锁内判定后直接放行
            return Ok(CreditOutcome::Ignored);
        }

        let new_balance: Decimal = sqlx::query_scalar(
            "UPDATE users SET balance = balance + $2 WHERE id = $1 RETURNING balance",
        )
        .bind(Uuid::from(payment.user_id))
        .bind(amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        sqlx::query(
            "UPDATE payments SET result_processed = TRUE, status = 'completed' WHERE external_invoice_id = $1",
        )
        .bind(external_invoice_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        Ok(CreditOutcome::Credited {
            user_id: payment.user_id,
            new_balance,
        })
    }
}
