//! Postgres 仓储实现。
//!
//! 数据库行与领域对象之间通过 `*Record` 结构体转换，枚举一律以
//! 文本列存储。条目类型的可选负载（频道用户名/机器人 inline/群组
//! 人数）各占一列，按 `kind` 判别取用。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use application::repository::{
    ApplicationRepository, CategoryRepository, ListingFilter, ListingRepository,
    PaymentRepository, UserRepository,
};
use domain::{
    ApplicationId, ApplicationStatus, Category, CategoryId, ChannelName, ChannelUrl, Listing,
    ListingApplication, ListingDraft, ListingId, ListingKind, ListingStatus, Payment, PaymentId,
    PaymentStatus, RepositoryError, User, UserId, UserRole,
};

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(ref db) if db.is_unique_violation() => RepositoryError::Conflict,
        other => RepositoryError::storage(other.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

/// `kind` 文本列加三个可选负载列，与 `ListingKind` 互转。
pub(crate) fn kind_from_columns(
    kind: &str,
    channel_username: Option<String>,
    bot_inline: Option<bool>,
    group_member_count: Option<i64>,
) -> Result<ListingKind, RepositoryError> {
    match kind {
        "channel" => Ok(ListingKind::Channel {
            username: channel_username,
        }),
        "bot" => Ok(ListingKind::Bot {
            inline: bot_inline.unwrap_or(false),
        }),
        "group" => Ok(ListingKind::Group {
            member_count: group_member_count,
        }),
        other => Err(invalid_data(format!("unknown listing kind: {other}"))),
    }
}

pub(crate) fn kind_to_columns(
    kind: &ListingKind,
) -> (&'static str, Option<String>, Option<bool>, Option<i64>) {
    match kind {
        ListingKind::Channel { username } => ("channel", username.clone(), None, None),
        ListingKind::Bot { inline } => ("bot", None, Some(*inline), None),
        ListingKind::Group { member_count } => ("group", None, None, *member_count),
    }
}

pub(crate) fn listing_status_from_str(status: &str) -> Result<ListingStatus, RepositoryError> {
    match status {
        "pending" => Ok(ListingStatus::Pending),
        "approved" => Ok(ListingStatus::Approved),
        "rejected" => Ok(ListingStatus::Rejected),
        other => Err(invalid_data(format!("unknown listing status: {other}"))),
    }
}

pub(crate) fn listing_status_to_str(status: ListingStatus) -> &'static str {
    match status {
        ListingStatus::Pending => "pending",
        ListingStatus::Approved => "approved",
        ListingStatus::Rejected => "rejected",
    }
}

fn application_status_from_str(status: &str) -> Result<ApplicationStatus, RepositoryError> {
    match status {
        "pending" => Ok(ApplicationStatus::Pending),
        "approved" => Ok(ApplicationStatus::Approved),
        "rejected" => Ok(ApplicationStatus::Rejected),
        other => Err(invalid_data(format!("unknown application status: {other}"))),
    }
}

fn application_status_to_str(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => "pending",
        ApplicationStatus::Approved => "approved",
        ApplicationStatus::Rejected => "rejected",
    }
}

fn payment_status_from_str(status: &str) -> Result<PaymentStatus, RepositoryError> {
    match status {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        other => Err(invalid_data(format!("unknown payment status: {other}"))),
    }
}

fn payment_status_to_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Completed => "completed",
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ListingRecord {
    id: Uuid,
    owner_id: Uuid,
    category_id: Uuid,
    kind: String,
    channel_username: Option<String>,
    bot_inline: Option<bool>,
    group_member_count: Option<i64>,
    name: String,
    url: String,
    description: Option<String>,
    image: Option<String>,
    status: String,
    is_top_promoted: bool,
    top_promoted_at: Option<DateTime<Utc>>,
    top_promotion_expiry: Option<DateTime<Utc>>,
    is_ultra_top_promoted: bool,
    ultra_top_promotion_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    view_count: i64,
    rating: i32,
}

impl TryFrom<ListingRecord> for Listing {
    type Error = RepositoryError;

    fn try_from(value: ListingRecord) -> Result<Self, Self::Error> {
        let kind = kind_from_columns(
            &value.kind,
            value.channel_username,
            value.bot_inline,
            value.group_member_count,
        )?;
        let name =
            ChannelName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        let url = ChannelUrl::parse(value.url).map_err(|err| invalid_data(err.to_string()))?;

        Ok(Listing {
            id: ListingId::from(value.id),
            owner_id: UserId::from(value.owner_id),
            category_id: CategoryId::from(value.category_id),
            kind,
            name,
            url,
            description: value.description,
            image: value.image,
            status: listing_status_from_str(&value.status)?,
            is_top_promoted: value.is_top_promoted,
            top_promoted_at: value.top_promoted_at,
            top_promotion_expiry: value.top_promotion_expiry,
            is_ultra_top_promoted: value.is_ultra_top_promoted,
            ultra_top_promotion_expiry: value.ultra_top_promotion_expiry,
            created_at: value.created_at,
            view_count: value.view_count,
            rating: value.rating,
        })
    }
}

pub(crate) const LISTING_COLUMNS: &str = "id, owner_id, category_id, kind, channel_username, bot_inline, \
     group_member_count, name, url, description, image, status, is_top_promoted, \
     top_promoted_at, top_promotion_expiry, is_ultra_top_promoted, ultra_top_promotion_expiry, \
     created_at, view_count, rating";

/// 单条条目的 INSERT，供仓储和审核事务共用。
pub(crate) async fn insert_listing<'e, E>(
    executor: E,
    listing: &Listing,
) -> Result<ListingRecord, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let (kind, channel_username, bot_inline, group_member_count) = kind_to_columns(&listing.kind);
    sqlx::query_as::<_, ListingRecord>(&format!(
        r#"
        INSERT INTO listings ({LISTING_COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        RETURNING {LISTING_COLUMNS}
        "#,
    ))
    .bind(Uuid::from(listing.id))
    .bind(Uuid::from(listing.owner_id))
    .bind(Uuid::from(listing.category_id))
    .bind(kind)
    .bind(channel_username)
    .bind(bot_inline)
    .bind(group_member_count)
    .bind(listing.name.as_str())
    .bind(listing.url.as_str())
    .bind(&listing.description)
    .bind(&listing.image)
    .bind(listing_status_to_str(listing.status))
    .bind(listing.is_top_promoted)
    .bind(listing.top_promoted_at)
    .bind(listing.top_promotion_expiry)
    .bind(listing.is_ultra_top_promoted)
    .bind(listing.ultra_top_promotion_expiry)
    .bind(listing.created_at)
    .bind(listing.view_count)
    .bind(listing.rating)
    .fetch_one(executor)
    .await
}

/// 单条条目的整行 UPDATE，供仓储和审核事务共用。
pub(crate) async fn update_listing<'e, E>(
    executor: E,
    listing: &Listing,
) -> Result<ListingRecord, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let (kind, channel_username, bot_inline, group_member_count) = kind_to_columns(&listing.kind);
    sqlx::query_as::<_, ListingRecord>(&format!(
        r#"
        UPDATE listings
        SET kind = $2, channel_username = $3, bot_inline = $4, group_member_count = $5,
            name = $6, url = $7, description = $8, image = $9, status = $10,
            is_top_promoted = $11, top_promoted_at = $12, top_promotion_expiry = $13,
            is_ultra_top_promoted = $14, ultra_top_promotion_expiry = $15, rating = $16
        WHERE id = $1
        RETURNING {LISTING_COLUMNS}
        "#,
    ))
    .bind(Uuid::from(listing.id))
    .bind(kind)
    .bind(channel_username)
    .bind(bot_inline)
    .bind(group_member_count)
    .bind(listing.name.as_str())
    .bind(listing.url.as_str())
    .bind(&listing.description)
    .bind(&listing.image)
    .bind(listing_status_to_str(listing.status))
    .bind(listing.is_top_promoted)
    .bind(listing.top_promoted_at)
    .bind(listing.top_promotion_expiry)
    .bind(listing.is_ultra_top_promoted)
    .bind(listing.ultra_top_promotion_expiry)
    .bind(listing.rating)
    .fetch_one(executor)
    .await
}

#[derive(Clone)]
pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn create(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        let record = insert_listing(&self.pool, &listing)
            .await
            .map_err(map_sqlx_err)?;
        Listing::try_from(record)
    }

    async fn update(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        let record = update_listing(&self.pool, &listing)
            .await
            .map_err(map_sqlx_err)?;
        Listing::try_from(record)
    }

    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        let record = sqlx::query_as::<_, ListingRecord>(&format!(
            r#"SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"#,
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Listing::try_from).transpose()
    }

    async fn list_approved(&self, filter: ListingFilter) -> Result<Vec<Listing>, RepositoryError> {
        // 排序交给应用层的排名逻辑，这里只按创建时间取稳定的初始顺序
        let records = sqlx::query_as::<_, ListingRecord>(&format!(
            r#"
            SELECT {LISTING_COLUMNS} FROM listings
            WHERE status = 'approved'
              AND ($1::uuid IS NULL OR category_id = $1)
              AND ($2::text IS NULL OR kind = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(filter.category_id.map(Uuid::from))
        .bind(filter.kind.map(|kind| kind.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Listing::try_from).collect()
    }

    async fn increment_views(&self, id: ListingId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE listings SET view_count = view_count + 1 WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
    price: Decimal,
}

impl From<CategoryRecord> for Category {
    fn from(value: CategoryRecord) -> Self {
        Category {
            id: CategoryId::from(value.id),
            name: value.name,
            price: value.price,
        }
    }
}

#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            r#"SELECT id, name, price FROM categories WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Category::from))
    }

    async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            r#"SELECT id, name, price FROM categories ORDER BY name"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Category::from).collect())
    }
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    balance: Decimal,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let role = match value.role.as_str() {
            "user" => UserRole::User,
            "admin" => UserRole::Admin,
            other => return Err(invalid_data(format!("unknown user role: {other}"))),
        };
        Ok(User {
            id: UserId::from(value.id),
            balance: value.balance,
            role,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, balance, role, created_at FROM users WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ApplicationRecord {
    id: Uuid,
    applicant_id: Uuid,
    category_id: Uuid,
    price: Decimal,
    kind: String,
    channel_username: Option<String>,
    bot_inline: Option<bool>,
    group_member_count: Option<i64>,
    name: String,
    url: String,
    description: Option<String>,
    image: Option<String>,
    status: String,
    rejection_reason: Option<String>,
    edit_of: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRecord> for ListingApplication {
    type Error = RepositoryError;

    fn try_from(value: ApplicationRecord) -> Result<Self, Self::Error> {
        let kind = kind_from_columns(
            &value.kind,
            value.channel_username,
            value.bot_inline,
            value.group_member_count,
        )?;
        let name =
            ChannelName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        let url = ChannelUrl::parse(value.url).map_err(|err| invalid_data(err.to_string()))?;

        Ok(ListingApplication {
            id: ApplicationId::from(value.id),
            applicant_id: UserId::from(value.applicant_id),
            category_id: CategoryId::from(value.category_id),
            price: value.price,
            draft: ListingDraft {
                kind,
                name,
                url,
                description: value.description,
                image: value.image,
            },
            status: application_status_from_str(&value.status)?,
            rejection_reason: value.rejection_reason,
            edit_of: value.edit_of.map(ListingId::from),
            created_at: value.created_at,
        })
    }
}

const APPLICATION_COLUMNS: &str = "id, applicant_id, category_id, price, kind, channel_username, \
     bot_inline, group_member_count, name, url, description, image, status, rejection_reason, \
     edit_of, created_at";

/// 单条申请的 INSERT，供仓储和计费事务共用。
pub(crate) async fn insert_application<'e, E>(
    executor: E,
    application: &ListingApplication,
) -> Result<ApplicationRecord, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let (kind, channel_username, bot_inline, group_member_count) =
        kind_to_columns(&application.draft.kind);
    sqlx::query_as::<_, ApplicationRecord>(&format!(
        r#"
        INSERT INTO listing_applications ({APPLICATION_COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING {APPLICATION_COLUMNS}
        "#,
    ))
    .bind(Uuid::from(application.id))
    .bind(Uuid::from(application.applicant_id))
    .bind(Uuid::from(application.category_id))
    .bind(application.price)
    .bind(kind)
    .bind(channel_username)
    .bind(bot_inline)
    .bind(group_member_count)
    .bind(application.draft.name.as_str())
    .bind(application.draft.url.as_str())
    .bind(&application.draft.description)
    .bind(&application.draft.image)
    .bind(application_status_to_str(application.status))
    .bind(&application.rejection_reason)
    .bind(application.edit_of.map(Uuid::from))
    .bind(application.created_at)
    .fetch_one(executor)
    .await
}

/// 单条申请的 UPDATE，供仓储和审核事务共用。
pub(crate) async fn update_application<'e, E>(
    executor: E,
    application: &ListingApplication,
) -> Result<ApplicationRecord, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let (kind, channel_username, bot_inline, group_member_count) =
        kind_to_columns(&application.draft.kind);
    sqlx::query_as::<_, ApplicationRecord>(&format!(
        r#"
        UPDATE listing_applications
        SET kind = $2, channel_username = $3, bot_inline = $4, group_member_count = $5,
            name = $6, url = $7, description = $8, image = $9,
            status = $10, rejection_reason = $11
        WHERE id = $1
        RETURNING {APPLICATION_COLUMNS}
        "#,
    ))
    .bind(Uuid::from(application.id))
    .bind(kind)
    .bind(channel_username)
    .bind(bot_inline)
    .bind(group_member_count)
    .bind(application.draft.name.as_str())
    .bind(application.draft.url.as_str())
    .bind(&application.draft.description)
    .bind(&application.draft.image)
    .bind(application_status_to_str(application.status))
    .bind(&application.rejection_reason)
    .fetch_one(executor)
    .await
}

#[derive(Clone)]
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationRepository for PgApplicationRepository {
    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ListingApplication>, RepositoryError> {
        let record = sqlx::query_as::<_, ApplicationRecord>(&format!(
            r#"SELECT {APPLICATION_COLUMNS} FROM listing_applications WHERE id = $1"#,
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(ListingApplication::try_from).transpose()
    }

    async fn list_pending(&self) -> Result<Vec<ListingApplication>, RepositoryError> {
        let records = sqlx::query_as::<_, ApplicationRecord>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS} FROM listing_applications
            WHERE status = 'pending'
            ORDER BY created_at
            "#,
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records
            .into_iter()
            .map(ListingApplication::try_from)
            .collect()
    }

    async fn update(
        &self,
        application: ListingApplication,
    ) -> Result<ListingApplication, RepositoryError> {
        let record = update_application(&self.pool, &application)
            .await
            .map_err(map_sqlx_err)?;
        ListingApplication::try_from(record)
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PaymentRecord {
    id: Uuid,
    user_id: Uuid,
    amount: Decimal,
    external_invoice_id: String,
    status: String,
    result_processed: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRecord> for Payment {
    type Error = RepositoryError;

    fn try_from(value: PaymentRecord) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from(value.id),
            user_id: UserId::from(value.user_id),
            amount: value.amount,
            external_invoice_id: value.external_invoice_id,
            status: payment_status_from_str(&value.status)?,
            result_processed: value.result_processed,
            created_at: value.created_at,
        })
    }
}

pub(crate) const PAYMENT_COLUMNS: &str =
    "id, user_id, amount, external_invoice_id, status, result_processed, created_at";

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let record = sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"
            INSERT INTO payments ({PAYMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(Uuid::from(payment.id))
        .bind(Uuid::from(payment.user_id))
        .bind(payment.amount)
        .bind(&payment.external_invoice_id)
        .bind(payment_status_to_str(payment.status))
        .bind(payment.result_processed)
        .bind(payment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Payment::try_from(record)
    }

    async fn find_by_invoice(
        &self,
        external_invoice_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let record = sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"SELECT {PAYMENT_COLUMNS} FROM payments WHERE external_invoice_id = $1"#,
        ))
        .bind(external_invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Payment::try_from).transpose()
    }
}

/// 一个连接池上的全部仓储。
pub struct PgStorage {
    pub pool: PgPool,
    pub listing_repository: Arc<PgListingRepository>,
    pub category_repository: Arc<PgCategoryRepository>,
    pub user_repository: Arc<PgUserRepository>,
    pub application_repository: Arc<PgApplicationRepository>,
    pub payment_repository: Arc<PgPaymentRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            listing_repository: Arc::new(PgListingRepository::new(pool.clone())),
            category_repository: Arc::new(PgCategoryRepository::new(pool.clone())),
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            application_repository: Arc::new(PgApplicationRepository::new(pool.clone())),
            payment_repository: Arc::new(PgPaymentRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
