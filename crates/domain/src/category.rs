use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::CategoryId;

/// 目录分类，价格即该分类下提交上架申请的费用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub price: Decimal,
}
