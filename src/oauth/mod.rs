//! # OAuth 联合登录子系统
//!
//! 把两类互不兼容的第三方授权协议（OAuth 2.0 授权码、OAuth 1.0a
//! 三腿签名请求）收拢在一个登录/回调契约之后，产出统一的
//! [`CanonicalIdentity`](types::CanonicalIdentity)。

pub mod config;
pub mod factory;
pub mod http;
pub mod jwks;
pub mod provider;
pub mod providers;
pub mod service;
pub mod signer;
pub mod state;
pub mod templates;
pub mod types;

pub use config::ConfigManager;
pub use factory::ProviderFactory;
pub use service::{CallbackParams, LoginRedirect, OAuthService};
pub use state::{StateManager, StateStats};
pub use templates::ProviderTemplates;
pub use types::{CanonicalIdentity, ProviderConfig, TokenBundle};
