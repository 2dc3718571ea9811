//! 统一错误处理
//!
//! 整个服务共用一个错误类型与 `Result` 别名，
//! 所有可能失败的函数都应返回 [`Result`]。

pub mod oauth;

pub use oauth::OAuthError;

/// 全局统一的 `Result` 类型
pub type Result<T> = std::result::Result<T, OAuthError>;

/// 错误分类，用于监控与 HTTP 状态码映射
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 调用方问题（未知提供商、配置缺失、state 无效），对应 4xx
    Client,
    /// 上游提供商或网络问题（令牌交换、用户信息获取），对应 5xx
    Upstream,
}
