//! Gitee 提供商
//!
//! 标准授权码流程；邮箱可能不在主资料里，回退到邮箱列表端点取
//! scope 含 primary 的地址。

use crate::error::{OAuthError, Result};
use crate::oauth::http::{parse_token_body, string_field};
use crate::oauth::provider::{build_code_auth_url, CodeFlow};
use crate::oauth::types::{normalize_email, CanonicalIdentity, ProviderConfig, TokenBundle};
use async_trait::async_trait;
use serde_json::Value;

pub struct GiteeProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GiteeProvider {
    pub fn new(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    async fn fallback_email(&self, access_token: &str) -> Option<String> {
        let emails_url = self.config.template.emails_url.as_deref()?;
        let response = self
            .client
            .get(emails_url)
            .query(&[("access_token", access_token)])
            .send()
            .await
            .ok()?;
        let emails: Vec<Value> = response.json().await.ok()?;

        let primary = emails.iter().find(|entry| {
            entry
                .get("scope")
                .and_then(Value::as_array)
                .map(|scopes| scopes.iter().any(|s| s.as_str() == Some("primary")))
                .unwrap_or(false)
        });
        let chosen = primary.or_else(|| emails.first())?;
        string_field(chosen, "email")
    }
}

#[async_trait]
impl CodeFlow for GiteeProvider {
    fn provider_name(&self) -> &'static str {
        "gitee"
    }

    fn build_auth_url(&self, state: &str) -> Result<String> {
        build_code_auth_url(&self.config, state, &[])
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenBundle> {
        let token_url = self.config.template.token_url.as_deref().ok_or_else(|| {
            OAuthError::configuration("gitee", "missing_token_url", "模板缺少令牌端点")
        })?;

        let response = self
            .client
            .post(token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                OAuthError::token("gitee", "token_request_failed", format!("令牌请求失败: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            OAuthError::token("gitee", "token_request_failed", format!("响应读取失败: {e}"))
        })?;
        if !status.is_success() {
            return Err(OAuthError::token(
                "gitee",
                "token_request_failed",
                format!("令牌端点返回 {status}"),
            ));
        }

        let token_data = parse_token_body(&body);
        let access_token = string_field(&token_data, "access_token")
            .ok_or_else(|| OAuthError::token("gitee", "no_token", "Gitee未返回访问令牌"))?;

        Ok(TokenBundle::Code {
            access_token,
            id_token: None,
        })
    }

    async fn fetch_user_info(&self, token: &TokenBundle) -> Result<CanonicalIdentity> {
        let access_token = token.access_token();
        let response = self
            .client
            .get(&self.config.template.user_info_url)
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| {
                OAuthError::user_info("gitee", "user_info_failed", format!("用户信息请求失败: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::user_info(
                "gitee",
                "user_info_failed",
                format!("用户信息端点返回 {status}"),
            ));
        }

        let user: Value = response.json().await.map_err(|e| {
            OAuthError::user_info("gitee", "user_info_failed", format!("用户信息解析失败: {e}"))
        })?;

        let uid = user
            .get("id")
            .and_then(Value::as_i64)
            .map(|id| id.to_string())
            .ok_or_else(|| OAuthError::user_info("gitee", "user_info_failed", "Gitee未返回用户ID"))?;
        let username = string_field(&user, "name")
            .or_else(|| string_field(&user, "login"))
            .unwrap_or_default();
        let avatar = string_field(&user, "avatar_url").unwrap_or_default();

        let mut raw_email = string_field(&user, "email");
        if raw_email.is_none() {
            raw_email = self.fallback_email(access_token).await;
        }
        let (email, email_collection_needed) = normalize_email(raw_email.as_deref());

        Ok(CanonicalIdentity {
            provider: "gitee".to_string(),
            uid,
            username,
            email,
            avatar,
            email_collection_needed,
        })
    }
}
