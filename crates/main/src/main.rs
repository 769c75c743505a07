//! 主应用程序入口
//!
//! 启动目录服务的 Axum Web API。

use std::sync::Arc;

use application::services::{
    ListingService, ListingServiceDependencies, ModerationService, ModerationServiceDependencies,
    PaymentService, PaymentServiceDependencies, PromotionPricing, PromotionService,
    PromotionServiceDependencies, SubmissionService, SubmissionServiceDependencies,
};
use application::{CloudPaymentsVerifier, RobokassaVerifier, SystemClock};
use config::AppConfig;
use infrastructure::{create_pg_pool, PgBillingStore, PgModerationStore, PgStorage};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').last().unwrap_or("unknown")
    );
    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    let storage = PgStorage::new(pg_pool.clone());
    let billing = Arc::new(PgBillingStore::new(pg_pool.clone()));
    let moderation_store = Arc::new(PgModerationStore::new(pg_pool));
    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);

    let listing_service = ListingService::new(ListingServiceDependencies {
        listing_repository: storage.listing_repository.clone(),
        category_repository: storage.category_repository.clone(),
        clock: clock.clone(),
    });

    let submission_service = SubmissionService::new(SubmissionServiceDependencies {
        category_repository: storage.category_repository.clone(),
        listing_repository: storage.listing_repository.clone(),
        billing: billing.clone(),
        clock: clock.clone(),
    });

    let promotion_service = PromotionService::new(PromotionServiceDependencies {
        listing_repository: storage.listing_repository.clone(),
        billing: billing.clone(),
        clock: clock.clone(),
        pricing: PromotionPricing {
            top_price: config.promotion.top_price,
            top_duration_days: config.promotion.top_duration_days,
            ultra_top_price_per_day: config.promotion.ultra_top_price_per_day,
        },
    });

    let payment_service = PaymentService::new(PaymentServiceDependencies {
        payment_repository: storage.payment_repository.clone(),
        user_repository: storage.user_repository.clone(),
        billing,
        clock: clock.clone(),
        robokassa: RobokassaVerifier::new(config.payments.robokassa_password2.clone()),
        cloudpayments: CloudPaymentsVerifier::new(config.payments.cloudpayments_api_secret.clone()),
    });

    let moderation_service = ModerationService::new(ModerationServiceDependencies {
        application_repository: storage.application_repository.clone(),
        listing_repository: storage.listing_repository.clone(),
        moderation_store,
        clock,
    });

    let state = AppState::new(
        Arc::new(listing_service),
        Arc::new(submission_service),
        Arc::new(promotion_service),
        Arc::new(payment_service),
        Arc::new(moderation_service),
    );

    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("目录服务器启动在 http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
