//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、事务边界、
//! 以及对外部适配器（仓储、计费存储、网关验签）的抽象。

pub mod billing;
pub mod clock;
pub mod dto;
pub mod error;
pub mod moderation;
pub mod repository;
pub mod services;
pub mod signature;

pub use billing::{BillingStore, CreditOutcome, PromotionGrant};
pub use clock::{Clock, SystemClock};
pub use dto::{ApplicationDto, BalanceDto, CategoryDto, ListingDto, PaymentDto};
pub use error::ApplicationError;
pub use moderation::{ListingWrite, ModerationStore};
pub use repository::{
    ApplicationRepository, CategoryRepository, ListingFilter, ListingRepository,
    PaymentRepository, UserRepository,
};
pub use services::{
    CreatePaymentRequest, GatewayCredit, ListingQuery, ListingService,
    ListingServiceDependencies, ModerationService, ModerationServiceDependencies, PaymentService,
    PaymentServiceDependencies, PromotionPricing, PromotionService, PromotionServiceDependencies,
    RobokassaResultRequest, SubmissionService, SubmissionServiceDependencies,
    SubmitApplicationRequest,
};
pub use signature::{CloudPaymentsVerifier, RobokassaVerifier};
