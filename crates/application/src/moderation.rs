//! 审核落库边界。
//!
//! 通过申请要写两处：申请状态翻转，条目新增或套用编辑。两者必须是
//! 同一原子单元，任一失败则两者都不可见，否则审核重试会把同一份
//! 申请落地成两个条目。

use async_trait::async_trait;

use domain::{Listing, ListingApplication};

use crate::error::ApplicationError;

/// 审核通过时条目侧要执行的写入。
#[derive(Debug, Clone)]
pub enum ListingWrite {
    Create(Listing),
    Update(Listing),
}

#[async_trait]
pub trait ModerationStore: Send + Sync {
    /// 申请更新与条目写入同一原子单元。
    async fn store_approval(
        &self,
        application: ListingApplication,
        listing: ListingWrite,
    ) -> Result<ListingApplication, ApplicationError>;
}
