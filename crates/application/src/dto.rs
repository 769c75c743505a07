use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::{
    ApplicationStatus, Category, Listing, ListingApplication, ListingKind, Payment, PaymentStatus,
    Timestamp,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: Uuid,
    pub kind: ListingKind,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// 按当前时刻惰性判定的推广状态，标志位本身可能已过期
    pub top_active: bool,
    pub ultra_top_active: bool,
    pub top_promotion_expiry: Option<Timestamp>,
    pub ultra_top_promotion_expiry: Option<Timestamp>,
    pub created_at: Timestamp,
    pub view_count: i64,
    pub rating: i32,
}

impl ListingDto {
    pub fn from_listing(listing: &Listing, now: Timestamp) -> Self {
        Self {
            id: Uuid::from(listing.id),
            owner_id: Uuid::from(listing.owner_id),
            category_id: Uuid::from(listing.category_id),
            kind: listing.kind.clone(),
            name: listing.name.as_str().to_owned(),
            url: listing.url.as_str().to_owned(),
            description: listing.description.clone(),
            image: listing.image.clone(),
            top_active: listing.is_top_active(now),
            ultra_top_active: listing.is_ultra_top_active(now),
            top_promotion_expiry: listing.top_promotion_expiry,
            ultra_top_promotion_expiry: listing.ultra_top_promotion_expiry,
            created_at: listing.created_at,
            view_count: listing.view_count,
            rating: listing.rating,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDto {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub category_id: Uuid,
    pub price: Decimal,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub edit_of: Option<Uuid>,
    pub created_at: Timestamp,
}

impl From<&ListingApplication> for ApplicationDto {
    fn from(application: &ListingApplication) -> Self {
        Self {
            id: Uuid::from(application.id),
            applicant_id: Uuid::from(application.applicant_id),
            category_id: Uuid::from(application.category_id),
            price: application.price,
            status: application.status,
            rejection_reason: application.rejection_reason.clone(),
            edit_of: application.edit_of.map(Uuid::from),
            created_at: application.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub external_invoice_id: String,
    pub status: PaymentStatus,
    pub result_processed: bool,
    pub created_at: Timestamp,
}

impl From<&Payment> for PaymentDto {
    fn from(payment: &Payment) -> Self {
        Self {
            id: Uuid::from(payment.id),
            user_id: Uuid::from(payment.user_id),
            amount: payment.amount,
            external_invoice_id: payment.external_invoice_id.clone(),
            status: payment.status,
            result_processed: payment.result_processed,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
}

impl From<&Category> for CategoryDto {
    fn from(category: &Category) -> Self {
        Self {
            id: Uuid::from(category.id),
            name: category.name.clone(),
            price: category.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceDto {
    pub user_id: Uuid,
    pub balance: Decimal,
}
