//! 基础设施层实现。
//!
//! 提供 Postgres 仓储与计费、审核事务，实现应用层定义的接口。

pub mod billing;
pub mod moderation;
pub mod repository;

pub use billing::PgBillingStore;
pub use moderation::PgModerationStore;
pub use repository::{
    create_pg_pool, PgApplicationRepository, PgCategoryRepository, PgListingRepository,
    PgPaymentRepository, PgStorage, PgUserRepository,
};
