//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的用例服务。

mod admin_routes;
mod error;
mod payment_routes;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
