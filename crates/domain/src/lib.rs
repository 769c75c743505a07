//! Telegram 目录系统核心领域模型
//!
//! 包含条目、上架申请、账户余额、支付等核心实体，推广排序规则，
//! 以及相关的领域错误类型。本层不做 I/O。

pub mod category;
pub mod errors;
pub mod listing;
pub mod listing_application;
pub mod payment;
pub mod ranking;
pub mod user;
pub mod value_objects;

pub use category::Category;
pub use errors::{DomainError, DomainResult, RepositoryError};
pub use listing::{Listing, ListingKind, ListingKindTag, ListingStatus, PromotionTier};
pub use listing_application::{ApplicationStatus, ListingApplication, ListingDraft};
pub use payment::{Payment, PaymentStatus};
pub use ranking::{display_order, rank_listings};
pub use user::{User, UserRole};
pub use value_objects::{
    ApplicationId, CategoryId, ChannelName, ChannelUrl, ListingId, PaymentId, Timestamp, UserId,
};
