use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{PaymentId, Timestamp, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

/// 充值支付单。
///
/// `result_processed` 只允许 false→true 一次：网关会重放回调，
/// 重复回调必须判定为重复而不是再次入账。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub external_invoice_id: String,
    pub status: PaymentStatus,
    pub result_processed: bool,
    pub created_at: Timestamp,
}

impl Payment {
    pub fn new(
        id: PaymentId,
        user_id: UserId,
        amount: Decimal,
        external_invoice_id: String,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            amount,
            external_invoice_id,
            status: PaymentStatus::Pending,
            result_processed: false,
            created_at: now,
        }
    }

    /// 标记回调已处理，重复标记视为业务规则违反。
    pub fn mark_processed(&mut self) -> DomainResult<()> {
        if self.result_processed {
            return Err(DomainError::business_rule_violation(
                "payment result already processed",
            ));
        }
        self.result_processed = true;
        self.status = PaymentStatus::Completed;
        Ok(())
    }
}
