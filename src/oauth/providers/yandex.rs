//! Yandex 提供商
//!
//! 用户信息端点用 `Authorization: OAuth <token>` 方案，头像地址
//! 由 `default_avatar_id` 拼出。

use crate::error::{OAuthError, Result};
use crate::oauth::http::{parse_token_body, string_field};
use crate::oauth::provider::{build_code_auth_url, CodeFlow};
use crate::oauth::types::{normalize_email, CanonicalIdentity, ProviderConfig, TokenBundle};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

pub struct YandexProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl YandexProvider {
    pub fn new(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl CodeFlow for YandexProvider {
    fn provider_name(&self) -> &'static str {
        "yandex"
    }

    fn build_auth_url(&self, state: &str) -> Result<String> {
        build_code_auth_url(&self.config, state, &[])
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenBundle> {
        let token_url = self.config.template.token_url.as_deref().ok_or_else(|| {
            OAuthError::configuration("yandex", "missing_token_url", "模板缺少令牌端点")
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
                OAuthError::token("yandex", "token_request_failed", format!("令牌请求失败: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            OAuthError::token("yandex", "token_request_failed", format!("响应读取失败: {e}"))
        })?;
        if !status.is_success() {
            return Err(OAuthError::token(
                "yandex",
                "token_request_failed",
                format!("令牌端点返回 {status}"),
            ));
        }

        let token_data = parse_token_body(&body);
        let access_token = string_field(&token_data, "access_token")
            .ok_or_else(|| OAuthError::token("yandex", "no_token", "Yandex未返回访问令牌"))?;

        Ok(TokenBundle::Code {
            access_token,
            id_token: None,
        })
    }

    async fn fetch_user_info(&self, token: &TokenBundle) -> Result<CanonicalIdentity> {
        let response = self
            .client
            .get(&self.config.template.user_info_url)
            .query(&[("format", "json")])
            .header(AUTHORIZATION, format!("OAuth {}", token.access_token()))
            .send()
            .await
            .map_err(|e| {
                OAuthError::user_info("yandex", "user_info_failed", format!("用户信息请求失败: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::user_info(
                "yandex",
                "user_info_failed",
                format!("用户信息端点返回 {status}"),
            ));
        }

        let user: Value = response.json().await.map_err(|e| {
            OAuthError::user_info("yandex", "user_info_failed", format!("用户信息解析失败: {e}"))
        })?;

        let uid = string_field(&user, "id")
            .ok_or_else(|| OAuthError::user_info("yandex", "user_info_failed", "Yandex未返回用户ID"))?;
        let username = string_field(&user, "login").unwrap_or_default();
        let avatar = string_field(&user, "default_avatar_id")
            .map(|id| format!("https://avatars.yandex.net/get-yapic/{id}/islands-200"))
            .unwrap_or_default();

        let raw_email = string_field(&user, "default_email");
        let (email, email_collection_needed) = normalize_email(raw_email.as_deref());

        Ok(CanonicalIdentity {
            provider: "yandex".to_string(),
            uid,
            username,
            email,
            avatar,
            email_collection_needed,
        })
    }
}
