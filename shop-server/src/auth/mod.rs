//! 认证授权模块
//!
//! 提供 JWT 认证与当前用户上下文：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文 (axum extractor)
//!
//! 登录/注册流程属于店面，不在本核心范围内。

pub mod extractor;
pub mod jwt;

pub use extractor::require_admin;
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
