//! 推广排序规则
//!
//! 给目录条目排出展示用的全序：生效中的超级置顶 > 生效中的置顶 > 其余按
//! 创建时间倒序。纯函数，无副作用；过期判定以到期时间为准，标志位不可信。

use std::cmp::Ordering;

use crate::listing::Listing;
use crate::value_objects::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RankTier {
    UltraTop,
    Top,
    Regular,
}

fn tier_of(listing: &Listing, now: Timestamp) -> RankTier {
    if listing.is_ultra_top_active(now) {
        RankTier::UltraTop
    } else if listing.is_top_active(now) {
        RankTier::Top
    } else {
        RankTier::Regular
    }
}

/// 展示顺序比较器。
///
/// 档内并列规则刻意不一致，沿袭既有产品行为，不要"修正"：
/// 超级置顶按到期时间倒序（剩余时间越多越靠前），
/// 置顶按授予时间倒序（最近购买越靠前）。
pub fn display_order(a: &Listing, b: &Listing, now: Timestamp) -> Ordering {
    let tier_a = tier_of(a, now);
    let tier_b = tier_of(b, now);
    if tier_a != tier_b {
        return tier_a.cmp(&tier_b);
    }

    match tier_a {
        RankTier::UltraTop => b
            .ultra_top_promotion_expiry
            .cmp(&a.ultra_top_promotion_expiry),
        RankTier::Top => b.top_promoted_at.cmp(&a.top_promoted_at),
        RankTier::Regular => b.created_at.cmp(&a.created_at),
    }
}

/// 按展示顺序就地排序。稳定排序，相等键保持原有相对次序。
pub fn rank_listings(listings: &mut [Listing], now: Timestamp) {
    listings.sort_by(|a, b| display_order(a, b, now));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{ListingKind, ListingStatus};
    use crate::value_objects::{CategoryId, ChannelName, ChannelUrl, ListingId, UserId};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn listing(name: &str, created_offset_hours: i64) -> Listing {
        Listing {
            id: ListingId::from(Uuid::new_v4()),
            owner_id: UserId::from(Uuid::new_v4()),
            category_id: CategoryId::from(Uuid::new_v4()),
            kind: ListingKind::Channel { username: None },
            name: ChannelName::parse(name).unwrap(),
            url: ChannelUrl::parse(format!("https://t.me/{name}")).unwrap(),
            description: None,
            image: None,
            status: ListingStatus::Approved,
            is_top_promoted: false,
            top_promoted_at: None,
            top_promotion_expiry: None,
            is_ultra_top_promoted: false,
            ultra_top_promotion_expiry: None,
            created_at: now() - Duration::hours(created_offset_hours),
            view_count: 0,
            rating: 0,
        }
    }

    fn ultra(name: &str, expires_in: Duration) -> Listing {
        let mut l = listing(name, 100);
        l.grant_ultra_top(now() + expires_in);
        l
    }

    fn top(name: &str, granted_ago: Duration) -> Listing {
        let mut l = listing(name, 100);
        l.grant_top(now() - granted_ago, now() + Duration::days(7));
        l
    }

    #[test]
    fn test_active_ultra_top_ranks_before_everything() {
        let mut listings = vec![
            listing("plain", 1),
            top("topped", Duration::hours(1)),
            ultra("featured", Duration::days(1)),
        ];
        rank_listings(&mut listings, now());
        assert_eq!(listings[0].name.as_str(), "featured");
    }

    #[test]
    fn test_ultra_top_tie_break_is_remaining_time() {
        // A 剩 2 天，B 剩 5 小时 → A 在前
        let mut listings = vec![
            ultra("b", Duration::hours(5)),
            ultra("a", Duration::days(2)),
        ];
        rank_listings(&mut listings, now());
        assert_eq!(listings[0].name.as_str(), "a");
        assert_eq!(listings[1].name.as_str(), "b");
    }

    #[test]
    fn test_top_tie_break_is_grant_time_not_expiry() {
        // 置顶档的并列规则与超级置顶相反：按购买时间倒序
        let mut older = top("older", Duration::hours(10));
        let mut newer = top("newer", Duration::hours(1));
        // 故意让先购买者到期更晚，验证到期时间在该档不参与排序
        older.top_promotion_expiry = Some(now() + Duration::days(30));
        newer.top_promotion_expiry = Some(now() + Duration::days(1));

        let mut listings = vec![older, newer];
        rank_listings(&mut listings, now());
        assert_eq!(listings[0].name.as_str(), "newer");
    }

    #[test]
    fn test_expired_promotion_flags_are_ignored() {
        // 标志位仍为 true 但已过期 → 当普通条目处理
        let mut stale = listing("stale", 50);
        stale.grant_ultra_top(now() - Duration::hours(1));
        let fresh = listing("fresh", 1);

        let mut listings = vec![stale, fresh];
        rank_listings(&mut listings, now());
        assert_eq!(listings[0].name.as_str(), "fresh");
        assert!(!listings[1].is_ultra_top_active(now()));
        assert!(listings[1].is_ultra_top_promoted);
    }

    #[test]
    fn test_regular_listings_sort_by_recency() {
        let mut listings = vec![
            listing("old", 48),
            listing("newest", 1),
            listing("middle", 24),
        ];
        rank_listings(&mut listings, now());
        let names: Vec<_> = listings.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["newest", "middle", "old"]);
    }

    #[test]
    fn test_full_tier_ordering() {
        let mut listings = vec![
            listing("plain-new", 1),
            top("top-old-grant", Duration::hours(20)),
            ultra("ultra-short", Duration::hours(2)),
            listing("plain-old", 72),
            top("top-new-grant", Duration::minutes(5)),
            ultra("ultra-long", Duration::days(3)),
        ];
        rank_listings(&mut listings, now());
        let names: Vec<_> = listings.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ultra-long",
                "ultra-short",
                "top-new-grant",
                "top-old-grant",
                "plain-new",
                "plain-old",
            ]
        );
    }
}
