//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的用例服务。

mod auth;
mod character_routes;
mod error;
mod routes;
mod species_routes;
mod state;
mod user_routes;

pub use auth::{AuthenticatedUser, Claims, JwtService, AUTH_TOKEN_HEADER};
pub use config::JwtConfig;
pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;
