use serde::{Deserialize, Serialize};

use crate::value_objects::{CategoryId, ChannelName, ChannelUrl, ListingId, Timestamp, UserId};

/// 条目类型，按类型携带各自的可选字段（频道/机器人/群组）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListingKind {
    Channel { username: Option<String> },
    Bot { inline: bool },
    Group { member_count: Option<i64> },
}

impl ListingKind {
    pub fn tag(&self) -> ListingKindTag {
        match self {
            ListingKind::Channel { .. } => ListingKindTag::Channel,
            ListingKind::Bot { .. } => ListingKindTag::Bot,
            ListingKind::Group { .. } => ListingKindTag::Group,
        }
    }
}

/// 不携带负载的类型判别值，用于过滤与存储。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKindTag {
    Channel,
    Bot,
    Group,
}

impl ListingKindTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKindTag::Channel => "channel",
            ListingKindTag::Bot => "bot",
            ListingKindTag::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

/// 目录条目。
///
/// 推广标志位可能过期后仍为 true，读取方必须以到期时间而非标志位
/// 作为推广是否生效的判定依据（惰性判定，没有后台清理任务）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: UserId,
    pub category_id: CategoryId,
    pub kind: ListingKind,
    pub name: ChannelName,
    pub url: ChannelUrl,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: ListingStatus,
    pub is_top_promoted: bool,
    pub top_promoted_at: Option<Timestamp>,
    pub top_promotion_expiry: Option<Timestamp>,
    pub is_ultra_top_promoted: bool,
    pub ultra_top_promotion_expiry: Option<Timestamp>,
    pub created_at: Timestamp,
    pub view_count: i64,
    pub rating: i32,
}

impl Listing {
    /// 置顶推广当前是否生效（标志位 + 未过期）。
    pub fn is_top_active(&self, now: Timestamp) -> bool {
        self.is_top_promoted
            && self
                .top_promotion_expiry
                .map(|expiry| now < expiry)
                .unwrap_or(false)
    }

    /// 超级置顶当前是否生效（标志位 + 未过期）。
    pub fn is_ultra_top_active(&self, now: Timestamp) -> bool {
        self.is_ultra_top_promoted
            && self
                .ultra_top_promotion_expiry
                .map(|expiry| now < expiry)
                .unwrap_or(false)
    }

    pub fn grant_top(&mut self, granted_at: Timestamp, expires_at: Timestamp) {
        self.is_top_promoted = true;
        self.top_promoted_at = Some(granted_at);
        self.top_promotion_expiry = Some(expires_at);
    }

    pub fn grant_ultra_top(&mut self, expires_at: Timestamp) {
        self.is_ultra_top_promoted = true;
        self.ultra_top_promotion_expiry = Some(expires_at);
    }
}

/// 推广档位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionTier {
    Top,
    UltraTop,
}
