//! 认证授权模块
//!
//! 提供 JWT 认证、角色检查、密码哈希和邮件链接能力令牌：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文
//! - [`require_auth`] - 认证中间件
//! - [`require_manager`] / [`require_technician`] - 角色检查中间件
//! - [`capability`] - 一次性审批链接令牌
//! - [`password`] - Argon2 密码哈希

pub mod capability;
pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use capability::{Capability, CapabilityAction, IssuedCapability};
pub use password::{hash_password, verify_password};
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{CurrentUserExt, require_auth, require_manager, require_technician};
