//! 充值与网关回调路由。
//!
//! Robokassa 走表单回调，成功时必须回 `OK{InvId}` 纯文本，否则网关
//! 会持续重试；CloudPayments 要求对请求原始报文验 HMAC，所以这里
//! 拿 `Bytes` 而不是 `Json`。

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Form, Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use application::services::{CreatePaymentRequest, RobokassaResultRequest};
use application::PaymentDto;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
struct CreatePaymentPayload {
    user_id: Uuid,
    amount: Decimal,
}

/// Robokassa Result URL 的表单字段名由网关固定。
#[derive(Debug, Deserialize)]
struct RobokassaResultForm {
    #[serde(rename = "OutSum")]
    out_sum: String,
    #[serde(rename = "InvId")]
    inv_id: String,
    #[serde(rename = "SignatureValue")]
    signature_value: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/robokassa/result", post(robokassa_result))
        .route("/payments/cloudpayments/pay", post(cloudpayments_pay))
}

async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentPayload>,
) -> Result<(StatusCode, Json<PaymentDto>), ApiError> {
    let dto = state
        .payment_service
        .create_payment(CreatePaymentRequest {
            user_id: payload.user_id,
            amount: payload.amount,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn robokassa_result(
    State(state): State<AppState>,
    Form(form): Form<RobokassaResultForm>,
) -> Result<String, ApiError> {
    let credit = state
        .payment_service
        .handle_robokassa_result(RobokassaResultRequest {
            out_sum: form.out_sum,
            inv_id: form.inv_id,
            signature_value: form.signature_value,
        })
        .await?;

    // 重复回调同样回 OK，网关才会停止重试
    Ok(format!("OK{}", credit.invoice_id))
}

async fn cloudpayments_pay(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let content_hmac = headers
        .get("Content-HMAC")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::forbidden("missing Content-HMAC header"))?;

    state
        .payment_service
        .handle_cloudpayments_pay(&body, content_hmac)
        .await?;

    Ok(Json(json!({ "code": 0 })))
}
