use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use domain::{DomainError, Payment, PaymentId, UserId};

use crate::{
    billing::{BillingStore, CreditOutcome},
    clock::Clock,
    dto::{BalanceDto, PaymentDto},
    error::ApplicationError,
    repository::{PaymentRepository, UserRepository},
    signature::{CloudPaymentsVerifier, RobokassaVerifier},
};

#[derive(Debug, Clone)]
pub struct CreatePaymentRequest {
    pub user_id: Uuid,
    pub amount: Decimal,
}

/// Robokassa Result URL 回调参数。
#[derive(Debug, Clone)]
pub struct RobokassaResultRequest {
    pub out_sum: String,
    pub inv_id: String,
    pub signature_value: String,
}

/// 网关回调的处理结果。
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCredit {
    pub invoice_id: String,
    pub outcome: CreditOutcome,
}

/// CloudPayments Pay 通知报文（只取入账需要的字段）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CloudPaymentsPayNotice {
    invoice_id: String,
    amount: String,
}

pub struct PaymentServiceDependencies {
    pub payment_repository: Arc<dyn PaymentRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub billing: Arc<dyn BillingStore>,
    pub clock: Arc<dyn Clock>,
    pub robokassa: RobokassaVerifier,
    pub cloudpayments: CloudPaymentsVerifier,
}

/// 充值链路：开单、余额查询、两个网关回调的幂等入账。
///
/// 回调处理顺序固定：先验签，再找单，再查重，最后才允许动余额。
/// 网关会重放回调，同一订单号至多入账一次是本服务的核心不变量。
pub struct PaymentService {
    deps: PaymentServiceDependencies,
}

impl PaymentService {
    pub fn new(deps: PaymentServiceDependencies) -> Self {
        Self { deps }
    }

    /// 创建待支付订单，返回网关将回显的订单号。
    pub async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentDto, ApplicationError> {
        if request.amount <= Decimal::ZERO {
            return Err(DomainError::validation("amount", "must be positive").into());
        }

        let user_id = UserId::from(request.user_id);
        self.deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::resource_not_found("user", user_id.to_string()))?;

        let payment = Payment::new(
            PaymentId::from(Uuid::new_v4()),
            user_id,
            request.amount,
            Uuid::new_v4().simple().to_string(),
            self.deps.clock.now(),
        );
        let stored = self.deps.payment_repository.create(payment).await?;

        tracing::info!(
            invoice_id = %stored.external_invoice_id,
            user_id = %stored.user_id,
            amount = %stored.amount,
            "created pending payment"
        );
        Ok(PaymentDto::from(&stored))
    }

    pub async fn balance_of(&self, user_id: Uuid) -> Result<BalanceDto, ApplicationError> {
        let user_id = UserId::from(user_id);
        let user = self
            .deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::resource_not_found("user", user_id.to_string()))?;
        Ok(BalanceDto {
            user_id: Uuid::from(user.id),
            balance: user.balance,
        })
    }

    /// Robokassa Result URL 回调。
    pub async fn handle_robokassa_result(
        &self,
        request: RobokassaResultRequest,
    ) -> Result<GatewayCredit, ApplicationError> {
        if !self.deps.robokassa.verify(
            &request.out_sum,
            &request.inv_id,
            &request.signature_value,
        ) {
            tracing::warn!(invoice_id = %request.inv_id, "robokassa callback signature mismatch");
            return Err(DomainError::invalid_signature("robokassa").into());
        }

        let amount: Decimal = request
            .out_sum
            .parse()
            .map_err(|_| DomainError::validation("OutSum", "not a valid amount"))?;

        self.credit("robokassa", request.inv_id, amount).await
    }

    /// CloudPayments Pay Webhook，报文原文参与验签。
    pub async fn handle_cloudpayments_pay(
        &self,
        body: &[u8],
        content_hmac: &str,
    ) -> Result<GatewayCredit, ApplicationError> {
        if !self.deps.cloudpayments.verify(body, content_hmac) {
            tracing::warn!("cloudpayments callback signature mismatch");
            return Err(DomainError::invalid_signature("cloudpayments").into());
        }

        let notice: CloudPaymentsPayNotice = serde_json::from_slice(body)
            .map_err(|_| DomainError::validation("body", "malformed pay notification"))?;
        let amount: Decimal = notice
            .amount
            .parse()
            .map_err(|_| DomainError::validation("Amount", "not a valid amount"))?;

        self.credit("cloudpayments", notice.invoice_id, amount)
            .await
    }

    async fn credit(
        &self,
        gateway: &str,
        invoice_id: String,
        amount: Decimal,
    ) -> Result<GatewayCredit, ApplicationError> {
        let outcome = self.deps.billing.credit_invoice(&invoice_id, amount).await?;

        match &outcome {
            CreditOutcome::Credited { user_id, new_balance } => {
                tracing::info!(
                    gateway,
                    invoice_id = %invoice_id,
                    user_id = %user_id,
                    amount = %amount,
                    new_balance = %new_balance,
                    "credited payment"
                );
            }
            CreditOutcome::Ignored => {
                tracing::info!(
                    gateway,
                    invoice_id = %invoice_id,
                    "duplicate payment callback ignored"
                );
            }
        }

        Ok(GatewayCredit {
            invoice_id,
            outcome,
        })
    }
}
