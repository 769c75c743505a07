use std::sync::Arc;

use application::{
    ListingService, ModerationService, PaymentService, PromotionService, SubmissionService,
};

#[derive(Clone)]
pub struct AppState {
    pub listing_service: Arc<ListingService>,
    pub submission_service: Arc<SubmissionService>,
    pub promotion_service: Arc<PromotionService>,
    pub payment_service: Arc<PaymentService>,
    pub moderation_service: Arc<ModerationService>,
}

impl AppState {
    pub fn new(
        listing_service: Arc<ListingService>,
        submission_service: Arc<SubmissionService>,
        promotion_service: Arc<PromotionService>,
        payment_service: Arc<PaymentService>,
        moderation_service: Arc<ModerationService>,
    ) -> Self {
        Self {
            listing_service,
            submission_service,
            promotion_service,
            payment_service,
            moderation_service,
        }
    }
}
