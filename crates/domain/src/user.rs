use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::{Timestamp, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

/// 账户。余额是唯一可信的付费依据，只允许经由数据库事务增减，
/// 任何进程内缓存都不得用于扣费判定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub balance: Decimal,
    pub role: UserRole,
    pub created_at: Timestamp,
}

impl User {
    pub fn can_afford(&self, price: Decimal) -> bool {
        self.balance >= price
    }
}
