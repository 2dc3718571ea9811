//! # 具体提供商实现
//!
//! 每个厂商模块只负责两件事：端点的调用方式与响应形状到
//! [`CanonicalIdentity`](crate::oauth::types::CanonicalIdentity) 的映射。
//! 协议流程本身在 [`provider`](crate::oauth::provider) 抽象层。

pub mod gitee;
pub mod github;
pub mod google;
pub mod qq;
pub mod twitter;
pub mod yandex;

pub use gitee::GiteeProvider;
pub use github::GithubProvider;
pub use google::GoogleProvider;
pub use qq::QqProvider;
pub use twitter::XProvider;
pub use yandex::YandexProvider;
