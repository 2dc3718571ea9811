//! Google 提供商
//!
//! 令牌响应携带 id_token，必须经 JWKS 校验（kid 匹配、签发方与受众
//! 核对）后才能信任其中的 sub / email；未经校验的声明绝不进入标准
//! 身份。显示名与头像从 people 端点补齐。授权时附带
//! `access_type=offline`。

use crate::error::{OAuthError, Result};
use crate::oauth::http::{parse_token_body, string_field};
use crate::oauth::jwks::JwksCache;
use crate::oauth::provider::{build_code_auth_url, CodeFlow};
use crate::oauth::types::{normalize_email, CanonicalIdentity, ProviderConfig, TokenBundle};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct GoogleProvider {
    config: ProviderConfig,
    client: reqwest::Client,
    jwks: Arc<JwksCache>,
}

impl GoogleProvider {
    pub fn new(config: ProviderConfig, client: reqwest::Client, jwks: Arc<JwksCache>) -> Self {
        Self {
            config,
            client,
            jwks,
        }
    }

    /// people 端点的展示信息（displayName / photo）
    async fn fetch_profile(&self, access_token: &str) -> Result<Value> {
        let response = self
            .client
            .get(&self.config.template.user_info_url)
            .query(&[("personFields", "names,emailAddresses,photos")])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                OAuthError::user_info("google", "user_info_failed", format!("用户信息请求失败: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::user_info(
                "google",
                "user_info_failed",
                format!("用户信息端点返回 {status}"),
            ));
        }

        response.json().await.map_err(|e| {
            OAuthError::user_info("google", "user_info_failed", format!("用户信息解析失败: {e}"))
        })
    }
}

#[async_trait]
impl CodeFlow for GoogleProvider {
    fn provider_name(&self) -> &'static str {
        "google"
    }

    fn build_auth_url(&self, state: &str) -> Result<String> {
        // offline 以便拿到 refresh_token
        build_code_auth_url(&self.config, state, &[("access_type", "offline")])
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenBundle> {
        let token_url = self.config.template.token_url.as_deref().ok_or_else(|| {
            OAuthError::configuration("google", "missing_token_url", "模板缺少令牌端点")
        })?;

        let response = self
            .client
            .post(token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                OAuthError::token("google", "token_request_failed", format!("令牌请求失败: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            OAuthError::token("google", "token_request_failed", format!("响应读取失败: {e}"))
        })?;
        if !status.is_success() {
            return Err(OAuthError::token(
                "google",
                "token_request_failed",
                format!("令牌端点返回 {status}"),
            ));
        }

        let token_data = parse_token_body(&body);

        let access_token = string_field(&token_data, "access_token")
            .ok_or_else(|| OAuthError::token("google", "no_token", "Google未返回访问令牌"))?;
        let id_token = string_field(&token_data, "id_token");

        Ok(TokenBundle::Code {
            access_token,
            id_token,
        })
    }

    async fn fetch_user_info(&self, token: &TokenBundle) -> Result<CanonicalIdentity> {
        let (access_token, id_token) = match token {
            TokenBundle::Code {
                access_token,
                id_token,
            } => (access_token.as_str(), id_token.as_deref()),
            TokenBundle::Signed { .. } => {
                return Err(OAuthError::user_info(
                    "google",
                    "user_info_failed",
                    "令牌类型与协议族不匹配",
                ));
            }
        };

        let id_token = id_token.ok_or_else(|| {
            OAuthError::user_info("google", "missing_id_token", "缺少Google ID Token")
        })?;
        let jwks_url = self.config.template.jwks_url.as_deref().ok_or_else(|| {
            OAuthError::configuration("google", "missing_jwks_url", "模板缺少密钥集端点")
        })?;

        // 先校验断言，sub / email 只从通过校验的声明里取
        let claims = self
            .jwks
            .verify_id_token(
                "google",
                jwks_url,
                id_token,
                &self.config.client_id,
                &self.config.template.issuers,
            )
            .await?;

        let profile = self.fetch_profile(access_token).await?;
        let username = profile
            .get("names")
            .and_then(Value::as_array)
            .and_then(|names| names.first())
            .and_then(|name| string_field(name, "displayName"))
            .or_else(|| claims.name.clone())
            .unwrap_or_default();
        let avatar = profile
            .get("photos")
            .and_then(Value::as_array)
            .and_then(|photos| photos.first())
            .and_then(|photo| string_field(photo, "url"))
            .or_else(|| claims.picture.clone())
            .unwrap_or_default();

        let (email, email_collection_needed) = normalize_email(claims.email.as_deref());

        Ok(CanonicalIdentity {
            provider: "google".to_string(),
            uid: claims.sub,
            username,
            email,
            avatar,
            email_collection_needed,
        })
    }
}
