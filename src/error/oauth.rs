//! OAuth 错误类型
//!
//! 定义第三方登录过程中可能出现的各种错误。每个变体携带提供商标识、
//! 短机器码与人类可读信息；内部的传输层/解析错误必须在提供商边界
//! 重新包装为这些变体，绝不向外泄露原始错误。

use super::ErrorCategory;
use thiserror::Error;

/// OAuth 专用错误类型
#[derive(Debug, Error)]
pub enum OAuthError {
    /// 配置解析或校验失败
    #[error("[{provider}] 配置错误: {message}")]
    Configuration {
        provider: String,
        code: String,
        message: String,
    },

    /// 不支持的提供商
    #[error("不支持的OAuth提供商: {provider}")]
    ProviderNotSupported { provider: String },

    /// state 验证失败（缺失、过期或已被消费）
    #[error("[{provider}] 状态验证失败: {message}")]
    StateValidation {
        provider: String,
        code: String,
        message: String,
    },

    /// 授权码 / 令牌交换阶段失败
    #[error("[{provider}] 令牌获取失败: {message}")]
    Token {
        provider: String,
        code: String,
        message: String,
    },

    /// 用户信息获取或校验阶段失败
    #[error("[{provider}] 用户信息获取失败: {message}")]
    UserInfo {
        provider: String,
        code: String,
        message: String,
    },
}

impl OAuthError {
    /// 创建配置错误
    pub fn configuration(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            provider: provider.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// 创建不支持的提供商错误
    pub fn provider_not_supported(provider: impl Into<String>) -> Self {
        Self::ProviderNotSupported {
            provider: provider.into(),
        }
    }

    /// 创建 state 验证错误
    pub fn state_validation(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::StateValidation {
            provider: provider.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// 创建令牌错误
    pub fn token(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Token {
            provider: provider.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// 创建用户信息错误
    pub fn user_info(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UserInfo {
            provider: provider.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// 出错的提供商标识
    pub fn provider(&self) -> &str {
        match self {
            Self::Configuration { provider, .. }
            | Self::ProviderNotSupported { provider }
            | Self::StateValidation { provider, .. }
            | Self::Token { provider, .. }
            | Self::UserInfo { provider, .. } => provider,
        }
    }

    /// 短机器码，用于结构化错误响应与日志检索
    pub fn code(&self) -> &str {
        match self {
            Self::Configuration { code, .. }
            | Self::StateValidation { code, .. }
            | Self::Token { code, .. }
            | Self::UserInfo { code, .. } => code,
            Self::ProviderNotSupported { .. } => "unsupported_provider",
        }
    }

    /// 错误分类
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. }
            | Self::ProviderNotSupported { .. }
            | Self::StateValidation { .. } => ErrorCategory::Client,
            Self::Token { .. } | Self::UserInfo { .. } => ErrorCategory::Upstream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_provider_tag() {
        let err = OAuthError::token("qq", "no_token", "QQ未返回访问令牌");
        assert_eq!(err.to_string(), "[qq] 令牌获取失败: QQ未返回访问令牌");
        assert_eq!(err.provider(), "qq");
        assert_eq!(err.code(), "no_token");
    }

    #[test]
    fn test_unsupported_provider_code() {
        let err = OAuthError::provider_not_supported("unknownvendor");
        assert_eq!(err.code(), "unsupported_provider");
        assert_eq!(err.to_string(), "不支持的OAuth提供商: unknownvendor");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            OAuthError::configuration("github", "incomplete_config", "缺少字段").category(),
            ErrorCategory::Client
        );
        assert_eq!(
            OAuthError::state_validation("google", "state_expired", "已过期").category(),
            ErrorCategory::Client
        );
        assert_eq!(
            OAuthError::user_info("x", "user_info_failed", "上游超时").category(),
            ErrorCategory::Upstream
        );
    }
}
