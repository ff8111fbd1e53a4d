//! 认证与授权
//!
//! - [`JwtService`] / [`Claims`] / [`CurrentUser`] — 令牌签发与解析
//! - [`middleware`] — require_auth / require_permission / require_admin
//! - [`permissions`] — 角色→权限策略表（唯一来源）

pub mod jwt;
pub mod middleware;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth, require_permission};
pub use permissions::get_default_permissions;
