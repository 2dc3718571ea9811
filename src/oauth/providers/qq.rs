//! QQ 提供商
//!
//! 三个历史包袱都在这家：令牌响应是表单编码文本而非 JSON；openid
//! 端点返回 `callback( {...} );` 包装，需要先剥壳再解析；用户信息
//! 端点用 HTTP 200 搭配响应体内的 `ret` 字段表达失败。QQ 从不返回
//! 邮箱，标准身份上的邮箱收集标记恒为真。

use crate::error::{OAuthError, Result};
use crate::oauth::http::{parse_token_body, string_field, unwrap_jsonp};
use crate::oauth::provider::{build_code_auth_url, CodeFlow};
use crate::oauth::types::{CanonicalIdentity, ProviderConfig, TokenBundle};
use async_trait::async_trait;
use serde_json::Value;

pub struct QqProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl QqProvider {
    pub fn new(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// 用访问令牌换 openid（JSONP 包装的 JSON）
    async fn fetch_openid(&self, access_token: &str) -> Result<String> {
        let openid_url = self.config.template.openid_url.as_deref().ok_or_else(|| {
            OAuthError::configuration("qq", "missing_openid_url", "模板缺少openid端点")
        })?;

        let response = self
            .client
            .get(openid_url)
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| {
                OAuthError::user_info("qq", "user_info_failed", format!("openid请求失败: {e}"))
            })?;

        let body = response.text().await.map_err(|e| {
            OAuthError::user_info("qq", "user_info_failed", format!("openid响应读取失败: {e}"))
        })?;

        let payload: Value = serde_json::from_str(unwrap_jsonp(&body)).map_err(|e| {
            OAuthError::user_info("qq", "user_info_failed", format!("openid响应解析失败: {e}"))
        })?;

        string_field(&payload, "openid")
            .ok_or_else(|| OAuthError::user_info("qq", "no_openid", "QQ未返回openid"))
    }
}

#[async_trait]
impl CodeFlow for QqProvider {
    fn provider_name(&self) -> &'static str {
        "qq"
    }

    fn build_auth_url(&self, state: &str) -> Result<String> {
        build_code_auth_url(&self.config, state, &[])
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenBundle> {
        let token_url = self.config.template.token_url.as_deref().ok_or_else(|| {
            OAuthError::configuration("qq", "missing_token_url", "模板缺少令牌端点")
        })?;

        let response = self
            .client
            .get(token_url)
            .query(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                OAuthError::token("qq", "token_request_failed", format!("令牌请求失败: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            OAuthError::token("qq", "token_request_failed", format!("响应读取失败: {e}"))
        })?;
        if !status.is_success() {
            return Err(OAuthError::token(
                "qq",
                "token_request_failed",
                format!("令牌端点返回 {status}"),
            ));
        }

        // QQ 的令牌响应是 access_token=xxx&expires_in=xxx 形状
        let token_data = parse_token_body(&body);
        let access_token = string_field(&token_data, "access_token")
            .ok_or_else(|| OAuthError::token("qq", "no_token", "QQ未返回访问令牌"))?;

        Ok(TokenBundle::Code {
            access_token,
            id_token: None,
        })
    }

    async fn fetch_user_info(&self, token: &TokenBundle) -> Result<CanonicalIdentity> {
        let access_token = token.access_token();
        let openid = self.fetch_openid(access_token).await?;

        let response = self
            .client
            .get(&self.config.template.user_info_url)
            .query(&[
                ("access_token", access_token),
                ("oauth_consumer_key", self.config.client_id.as_str()),
                ("openid", openid.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                OAuthError::user_info("qq", "user_info_failed", format!("用户信息请求失败: {e}"))
            })?;

        let user: Value = response.json().await.map_err(|e| {
            OAuthError::user_info("qq", "user_info_failed", format!("用户信息解析失败: {e}"))
        })?;

        // HTTP 200 不代表成功，失败通过响应体内的 ret 表达
        match user.get("ret").and_then(Value::as_i64) {
            Some(0) => {}
            _ => {
                let message = string_field(&user, "msg").unwrap_or_else(|| "未知错误".to_string());
                return Err(OAuthError::user_info(
                    "qq",
                    "api_error",
                    format!("QQ返回用户信息错误: {message}"),
                ));
            }
        }

        let username = string_field(&user, "nickname").unwrap_or_default();
        let avatar = string_field(&user, "figureurl_qq_2")
            .or_else(|| string_field(&user, "figureurl_qq_1"))
            .unwrap_or_default();

        // QQ 不提供邮箱，外围应用必须另行收集
        Ok(CanonicalIdentity {
            provider: "qq".to_string(),
            uid: openid,
            username,
            email: String::new(),
            avatar,
            email_collection_needed: true,
        })
    }
}
