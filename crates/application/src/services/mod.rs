mod listing_service;
mod moderation_service;
mod payment_service;
mod promotion_service;
mod submission_service;

pub use listing_service::{ListingQuery, ListingService, ListingServiceDependencies};
pub use moderation_service::{ModerationService, ModerationServiceDependencies};
pub use payment_service::{
    CreatePaymentRequest, GatewayCredit, PaymentService, PaymentServiceDependencies,
    RobokassaResultRequest,
};
pub use promotion_service::{PromotionPricing, PromotionService, PromotionServiceDependencies};
pub use submission_service::{
    SubmissionService, SubmissionServiceDependencies, SubmitApplicationRequest,
};

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod listing_service_tests;
#[cfg(test)]
mod moderation_service_tests;
