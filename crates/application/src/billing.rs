//! 计费事务边界
//!
//! 所有涉及余额的多步写入都收口到 `BillingStore`：扣费+建申请、扣费+推广、
//! 回调入账+标记已处理。每个方法都必须是一个原子单元（数据库事务或等价物），
//! 余额的读改写不允许出现在事务之外。

use async_trait::async_trait;
use rust_decimal::Decimal;

use domain::{Listing, ListingApplication, ListingId, PromotionTier, Timestamp, UserId};

use crate::error::ApplicationError;

/// 一次推广授予的全部参数。
#[derive(Debug, Clone, Copy)]
pub struct PromotionGrant {
    pub listing_id: ListingId,
    pub tier: PromotionTier,
    pub granted_at: Timestamp,
    pub expires_at: Timestamp,
}

/// 回调入账结果。`Ignored` 表示重复回调，余额未变，不是错误。
#[derive(Debug, Clone, PartialEq)]
pub enum CreditOutcome {
    Credited {
        user_id: UserId,
        new_balance: Decimal,
    },
    Ignored,
}

#[async_trait]
pub trait BillingStore: Send + Sync {
    /// 扣除申请费并创建待审申请，二者同一原子单元。
    /// 余额不足时返回 `InsufficientBalance` 且不产生任何写入；
    /// 并发提交不允许基于旧读数联合透支。
    async fn charge_and_create_application(
        &self,
        application: ListingApplication,
    ) -> Result<ListingApplication, ApplicationError>;

    /// 零价编辑重提，绕过余额闸门，只插入申请。
    async fn create_free_application(
        &self,
        application: ListingApplication,
    ) -> Result<ListingApplication, ApplicationError>;

    /// 扣除推广费并写入推广标志/时间，同一原子单元。
    async fn charge_and_promote(
        &self,
        user_id: UserId,
        price: Decimal,
        grant: PromotionGrant,
    ) -> Result<Listing, ApplicationError>;

    /// 按订单号入账：加余额 + 标记 `result_processed`，同一原子单元。
    /// 已处理过的订单返回 `Ignored`，保证每单至多入账一次。
    async fn credit_invoice(
        &self,
        external_invoice_id: &str,
        amount: Decimal,
    ) -> Result<CreditOutcome, ApplicationError>;
}

pub mod memory {
    //! 内存版计费存储，单把互斥锁模拟数据库事务的原子性。
    //! 供单元测试与本地试跑使用，语义与 Pg 实现保持一致。

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use domain::{
        DomainError, Listing, ListingApplication, ListingId, ListingStatus, Payment,
        PromotionTier, User, UserId,
    };

    use crate::error::ApplicationError;

    use super::{BillingStore, CreditOutcome, PromotionGrant};

    #[derive(Default)]
    struct State {
        users: HashMap<UserId, User>,
        listings: HashMap<ListingId, Listing>,
        applications: Vec<ListingApplication>,
        payments: HashMap<String, Payment>,
    }

    #[derive(Default)]
    pub struct MemoryBillingStore {
        state: Mutex<State>,
    }

    impl MemoryBillingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert_user(&self, user: User) {
            self.lock().users.insert(user.id, user);
        }

        pub fn insert_listing(&self, listing: Listing) {
            self.lock().listings.insert(listing.id, listing);
        }

        pub fn insert_payment(&self, payment: Payment) {
            self.lock()
                .payments
                .insert(payment.external_invoice_id.clone(), payment);
        }

        pub fn balance_of(&self, user_id: UserId) -> Option<Decimal> {
            self.lock().users.get(&user_id).map(|user| user.balance)
        }

        pub fn user(&self, user_id: UserId) -> Option<User> {
            self.lock().users.get(&user_id).cloned()
        }

        pub fn applications(&self) -> Vec<ListingApplication> {
            self.lock().applications.clone()
        }

        pub fn listing(&self, id: ListingId) -> Option<Listing> {
            self.lock().listings.get(&id).cloned()
        }

        pub fn payment(&self, external_invoice_id: &str) -> Option<Payment> {
            self.lock().payments.get(external_invoice_id).cloned()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, State> {
            self.state.lock().expect("billing state mutex poisoned")
        }
    }

    #[async_trait]
    impl BillingStore for MemoryBillingStore {
        async fn charge_and_create_application(
            &self,
            application: ListingApplication,
        ) -> Result<ListingApplication, ApplicationError> {
            let mut state = self.lock();
            let user = state
                .users
                .get_mut(&application.applicant_id)
                .ok_or_else(|| {
                    DomainError::resource_not_found("user", application.applicant_id.to_string())
                })?;
            if user.balance < application.price {
                return Err(
                    DomainError::insufficient_balance(application.price, user.balance).into(),
                );
            }
            user.balance -= application.price;
            state.applications.push(application.clone());
            Ok(application)
        }

        async fn create_free_application(
            &self,
            application: ListingApplication,
        ) -> Result<ListingApplication, ApplicationError> {
            self.lock().applications.push(application.clone());
            Ok(application)
        }

        async fn charge_and_promote(
            &self,
            user_id: UserId,
            price: Decimal,
            grant: PromotionGrant,
        ) -> Result<Listing, ApplicationError> {
            let mut state = self.lock();

            match state.listings.get(&grant.listing_id) {
                None => {
                    return Err(DomainError::resource_not_found(
                        "listing",
                        grant.listing_id.to_string(),
                    )
                    .into())
                }
                Some(listing) if listing.status != ListingStatus::Approved => {
                    return Err(DomainError::business_rule_violation(
                        "only approved listings can be promoted",
                    )
                    .into())
                }
                Some(_) => {}
            }

            let user = state
                .users
                .get_mut(&user_id)
                .ok_or_else(|| DomainError::resource_not_found("user", user_id.to_string()))?;
            if user.balance < price {
                return Err(DomainError::insufficient_balance(price, user.balance).into());
            }
            user.balance -= price;

            let listing = state
                .listings
                .get_mut(&grant.listing_id)
                .expect("listing checked above");
            match grant.tier {
                PromotionTier::Top => listing.grant_top(grant.granted_at, grant.expires_at),
                PromotionTier::UltraTop => listing.grant_ultra_top(grant.expires_at),
            }
            Ok(listing.clone())
        }

        async fn credit_invoice(
            &self,
            external_invoice_id: &str,
            amount: Decimal,
        ) -> Result<CreditOutcome, ApplicationError> {
            let mut state = self.lock();

            let payment = match state.payments.get(external_invoice_id) {
                Some(payment) => payment.clone(),
                None => {
                    return Err(DomainError::unknown_invoice(external_invoice_id).into());
                }
            };
            if payment.amount != amount {
                return Err(
                    DomainError::validation("amount", "does not match invoice amount").into(),
                );
            }
            if payment.result_processed {
                return Ok(CreditOutcome::Ignored);
            }

            let user = state
                .users
                .get_mut(&payment.user_id)
                .ok_or_else(|| {
                    DomainError::resource_not_found("user", payment.user_id.to_string())
                })?;
            user.balance += amount;
            let new_balance = user.balance;

            let payment = state
                .payments
                .get_mut(external_invoice_id)
                .expect("payment checked above");
            payment.mark_processed()?;

            Ok(CreditOutcome::Credited {
                user_id: payment.user_id,
                new_balance,
            })
        }
    }
}
