//! # OAuth 核心数据模型
//!
//! 提供商配置、令牌载体与标准化用户身份。除 [`CanonicalIdentity`] 外，
//! 所有类型仅在一次登录 / 回调处理内部存活，不做持久化。

use serde::{Deserialize, Serialize};

/// 协议族：两类互不兼容的授权协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolFamily {
    /// OAuth 2.0 授权码模式
    AuthorizationCode,
    /// OAuth 1.0a 三腿签名请求模式
    SignedRequest,
}

/// 单个提供商的静态协议模板：端点与默认 scope，不含运营方凭据
#[derive(Debug, Clone)]
pub struct ProviderTemplate {
    pub family: ProtocolFamily,
    /// 交互式授权页
    pub auth_url: String,
    /// 授权码换令牌端点（授权码族）
    pub token_url: Option<String>,
    /// request token 端点（签名请求族）
    pub request_token_url: Option<String>,
    /// access token 端点（签名请求族）
    pub access_token_url: Option<String>,
    /// 用户信息端点
    pub user_info_url: String,
    /// 邮箱列表端点（github / gitee 在主资料无邮箱时回退使用）
    pub emails_url: Option<String>,
    /// openid 端点（qq 在取用户信息前先换 openid）
    pub openid_url: Option<String>,
    /// 签名密钥集端点（google 校验 id_token 用）
    pub jwks_url: Option<String>,
    /// 可接受的 id_token 签发方
    pub issuers: Vec<String>,
    /// 默认授权范围
    pub scope: Option<String>,
}

/// 解析完成的提供商配置：模板与动态凭据合并后的产物
///
/// 每次请求现场解析，合并完成后所有协议必需字段均已就位。
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_name: String,
    pub template: ProviderTemplate,
    /// 授权码族的 client_id，签名请求族的 consumer key
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// 覆盖模板默认值后的授权范围
    pub scope: Option<String>,
}

/// 令牌交换产物，只在当次回调处理内存活
#[derive(Debug, Clone)]
pub enum TokenBundle {
    /// 授权码族：bearer 令牌，google 额外携带待校验的 id_token
    Code {
        access_token: String,
        id_token: Option<String>,
    },
    /// 签名请求族：令牌 + 令牌密钥对
    Signed {
        access_token: String,
        access_token_secret: String,
    },
}

impl TokenBundle {
    /// 访问令牌本体
    pub fn access_token(&self) -> &str {
        match self {
            Self::Code { access_token, .. } | Self::Signed { access_token, .. } => access_token,
        }
    }
}

/// 签名请求族第一腿获得的临时令牌对
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

/// 标准化用户身份，本子系统交给外围应用的唯一产物
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalIdentity {
    /// 提供商标识
    pub provider: String,
    /// 提供商命名空间内的唯一用户 ID
    pub uid: String,
    /// 显示名
    pub username: String,
    /// 邮箱，可能为空串
    pub email: String,
    /// 头像地址
    pub avatar: String,
    /// 提供商未给出可用邮箱，外围应用需另行收集
    pub email_collection_needed: bool,
}

/// 归一化提供商返回的原始邮箱字段
///
/// 空串、null、字段缺失一律视为"需要收集"，返回 `("", true)`。
pub fn normalize_email(raw: Option<&str>) -> (String, bool) {
    match raw {
        Some(email) if !email.trim().is_empty() => (email.to_string(), false),
        _ => (String::new(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_present() {
        assert_eq!(
            normalize_email(Some("user@example.com")),
            ("user@example.com".to_string(), false)
        );
    }

    #[test]
    fn test_normalize_email_absent_variants() {
        assert_eq!(normalize_email(None), (String::new(), true));
        assert_eq!(normalize_email(Some("")), (String::new(), true));
        assert_eq!(normalize_email(Some("   ")), (String::new(), true));
    }

    #[test]
    fn test_token_bundle_access_token() {
        let code = TokenBundle::Code {
            access_token: "at1".to_string(),
            id_token: None,
        };
        let signed = TokenBundle::Signed {
            access_token: "at2".to_string(),
            access_token_secret: "s2".to_string(),
        };
        assert_eq!(code.access_token(), "at1");
        assert_eq!(signed.access_token(), "at2");
    }
}
