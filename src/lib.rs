//! # 第三方登录联合认证服务核心库
//!
//! 统一 OAuth 1.0a / OAuth 2.0 提供商的登录与回调契约，
//! 产出提供商无关的标准用户身份。

pub mod config;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod server;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{OAuthError, Result};
pub use oauth::{CanonicalIdentity, OAuthService};
