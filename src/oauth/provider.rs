//! # 提供商抽象
//!
//! 两个互斥的协议变体各自一个能力 trait，具体厂商实现其一；
//! [`OAuthProvider`] 把二者收拢成一个带标签的联合供工厂与编排层使用。
//! 中间产物（request token、TokenBundle）一律作为参数显式穿越各步，
//! 不落在实例状态里，保证并发请求下可重入。

use crate::error::{OAuthError, Result};
use crate::oauth::types::{CanonicalIdentity, ProviderConfig, RequestToken, TokenBundle};
use async_trait::async_trait;
use url::Url;

/// 授权码（token-exchange）协议变体
#[async_trait]
pub trait CodeFlow: Send + Sync {
    /// 提供商标识
    fn provider_name(&self) -> &'static str;

    /// 构造指向厂商授权页的跳转地址，`state` 原样嵌入由厂商回显
    fn build_auth_url(&self, state: &str) -> Result<String>;

    /// 用授权码换访问令牌
    async fn exchange_code(&self, code: &str) -> Result<TokenBundle>;

    /// 拉取并标准化用户信息
    async fn fetch_user_info(&self, token: &TokenBundle) -> Result<CanonicalIdentity>;
}

/// 签名请求（三腿）协议变体
#[async_trait]
pub trait SignedFlow: Send + Sync {
    /// 提供商标识
    fn provider_name(&self) -> &'static str;

    /// 第一腿：签名 POST 获取 request token
    async fn request_token(&self, callback_uri: &str) -> Result<RequestToken>;

    /// 把 request token 拼到厂商交互授权页
    fn build_auth_url(&self, request_token: &str) -> Result<String>;

    /// 第三腿：verifier 换访问令牌对
    async fn exchange_verifier(
        &self,
        token: &str,
        token_secret: &str,
        verifier: &str,
    ) -> Result<TokenBundle>;

    /// 签名 GET 拉取用户信息；缺少 token secret 无法产出签名，直接报 UserInfo
    async fn fetch_user_info(
        &self,
        access_token: &str,
        access_token_secret: Option<&str>,
    ) -> Result<CanonicalIdentity>;
}

/// 提供商联合体：一个接口、两个协议变体
pub enum OAuthProvider {
    Code(Box<dyn CodeFlow>),
    Signed(Box<dyn SignedFlow>),
}

impl std::fmt::Debug for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(provider) => f
                .debug_tuple("Code")
                .field(&provider.provider_name())
                .finish(),
            Self::Signed(provider) => f
                .debug_tuple("Signed")
                .field(&provider.provider_name())
                .finish(),
        }
    }
}

impl OAuthProvider {
    /// 提供商标识
    pub fn name(&self) -> &'static str {
        match self {
            Self::Code(provider) => provider.provider_name(),
            Self::Signed(provider) => provider.provider_name(),
        }
    }
}

/// 授权码族通用的授权地址拼装
///
/// client_id、redirect_uri、scope、response_type 与 `state` 之外，
/// 各家的附加参数（如 google 的 `access_type=offline`）由 `extra` 传入。
pub fn build_code_auth_url(
    config: &ProviderConfig,
    state: &str,
    extra: &[(&str, &str)],
) -> Result<String> {
    let mut url = Url::parse(&config.template.auth_url).map_err(|e| {
        OAuthError::configuration(
            &config.provider_name,
            "invalid_auth_url",
            format!("授权地址无效: {e}"),
        )
    })?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("response_type", "code");
        pairs.append_pair("client_id", &config.client_id);
        pairs.append_pair("redirect_uri", &config.redirect_uri);
        pairs.append_pair("state", state);
        if let Some(scope) = &config.scope {
            pairs.append_pair("scope", scope);
        }
        for (key, value) in extra {
            pairs.append_pair(key, value);
        }
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::templates::ProviderTemplates;
    use crate::oauth::types::ProviderConfig;

    fn config_for(provider: &str) -> ProviderConfig {
        let templates = ProviderTemplates::builtin();
        ProviderConfig {
            provider_name: provider.to_string(),
            template: templates.get(provider).unwrap().clone(),
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "https://blog.example.com/oauth/callback/github".to_string(),
            scope: Some("user:email".to_string()),
        }
    }

    #[test]
    fn test_build_code_auth_url_embeds_state_verbatim() {
        let url = build_code_auth_url(&config_for("github"), "State-123_x", &[]).unwrap();
        assert!(url.contains("state=State-123_x"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("scope=user%3Aemail"));
    }

    #[test]
    fn test_build_code_auth_url_extra_params() {
        let url =
            build_code_auth_url(&config_for("google"), "s", &[("access_type", "offline")]).unwrap();
        assert!(url.contains("access_type=offline"));
    }
}
