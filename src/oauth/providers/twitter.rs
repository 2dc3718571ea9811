//! X / Twitter 提供商（OAuth 1.0a 三腿流程）
//!
//! 三条腿全部经 HMAC-SHA1 签名：request token、verifier 换访问令牌、
//! verify_credentials 取用户信息。前两条腿的响应都是表单编码文本。
//! 用户信息请求带 `include_email=true`，头像地址去掉 `_normal` 后缀
//! 取原图。

use crate::error::{OAuthError, Result};
use crate::oauth::http::{form_pairs, string_field};
use crate::oauth::provider::SignedFlow;
use crate::oauth::signer::OAuth1Signer;
use crate::oauth::types::{
    normalize_email, CanonicalIdentity, ProviderConfig, RequestToken, TokenBundle,
};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use url::Url;

pub struct XProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl XProvider {
    pub fn new(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn signer<'a>(
        &'a self,
        token: Option<&'a str>,
        token_secret: Option<&'a str>,
    ) -> OAuth1Signer<'a> {
        OAuth1Signer {
            consumer_key: &self.config.client_id,
            consumer_secret: &self.config.client_secret,
            token,
            token_secret,
        }
    }
}

#[async_trait]
impl SignedFlow for XProvider {
    fn provider_name(&self) -> &'static str {
        "x"
    }

    async fn request_token(&self, callback_uri: &str) -> Result<RequestToken> {
        let request_token_url =
            self.config.template.request_token_url.as_deref().ok_or_else(|| {
                OAuthError::configuration("x", "missing_request_token_url", "模板缺少request token端点")
            })?;

        let auth_header = self.signer(None, None).sign(
            "POST",
            request_token_url,
            &[("oauth_callback", callback_uri)],
        );

        let response = self
            .client
            .post(request_token_url)
            .header(AUTHORIZATION, auth_header)
            .send()
            .await
            .map_err(|e| {
                OAuthError::token("x", "request_token_failed", format!("请求令牌失败: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            OAuthError::token("x", "request_token_failed", format!("响应读取失败: {e}"))
        })?;
        if !status.is_success() {
            return Err(OAuthError::token(
                "x",
                "request_token_failed",
                format!("request token端点返回 {status}"),
            ));
        }

        let pairs = form_pairs(&body);
        match (pairs.get("oauth_token"), pairs.get("oauth_token_secret")) {
            (Some(token), Some(secret)) if !token.is_empty() && !secret.is_empty() => {
                Ok(RequestToken {
                    token: token.clone(),
                    secret: secret.clone(),
                })
            }
            _ => Err(OAuthError::token("x", "no_request_token", "Twitter未返回请求令牌")),
        }
    }

    fn build_auth_url(&self, request_token: &str) -> Result<String> {
        let mut url = Url::parse(&self.config.template.auth_url).map_err(|e| {
            OAuthError::configuration("x", "invalid_auth_url", format!("授权地址无效: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("oauth_token", request_token);
        Ok(url.into())
    }

    async fn exchange_verifier(
        &self,
        token: &str,
        token_secret: &str,
        verifier: &str,
    ) -> Result<TokenBundle> {
        let access_token_url =
            self.config.template.access_token_url.as_deref().ok_or_else(|| {
                OAuthError::configuration("x", "missing_access_token_url", "模板缺少access token端点")
            })?;

        let auth_header = self.signer(Some(token), Some(token_secret)).sign(
            "POST",
            access_token_url,
            &[("oauth_verifier", verifier)],
        );

        let response = self
            .client
            .post(access_token_url)
            .header(AUTHORIZATION, auth_header)
            .send()
            .await
            .map_err(|e| {
                OAuthError::token("x", "access_token_failed", format!("访问令牌请求失败: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            OAuthError::token("x", "access_token_failed", format!("响应读取失败: {e}"))
        })?;
        if !status.is_success() {
            return Err(OAuthError::token(
                "x",
                "access_token_failed",
                format!("access token端点返回 {status}"),
            ));
        }

        let pairs = form_pairs(&body);
        match (pairs.get("oauth_token"), pairs.get("oauth_token_secret")) {
            (Some(access_token), Some(secret))
                if !access_token.is_empty() && !secret.is_empty() =>
            {
                Ok(TokenBundle::Signed {
                    access_token: access_token.clone(),
                    access_token_secret: secret.clone(),
                })
            }
            _ => Err(OAuthError::token("x", "no_access_token", "Twitter未返回访问令牌")),
        }
    }

    async fn fetch_user_info(
        &self,
        access_token: &str,
        access_token_secret: Option<&str>,
    ) -> Result<CanonicalIdentity> {
        // 没有令牌密钥就无法产出签名
        let access_token_secret = access_token_secret.ok_or_else(|| {
            OAuthError::user_info("x", "missing_token_secret", "Twitter OAuth 1.0需要access_token_secret")
        })?;

        let user_info_url = format!("{}?include_email=true", self.config.template.user_info_url);
        let auth_header = self
            .signer(Some(access_token), Some(access_token_secret))
            .sign("GET", &user_info_url, &[]);

        let response = self
            .client
            .get(&user_info_url)
            .header(AUTHORIZATION, auth_header)
            .send()
            .await
            .map_err(|e| {
                OAuthError::user_info("x", "user_info_failed", format!("用户信息请求失败: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::user_info(
                "x",
                "user_info_failed",
                format!("用户信息端点返回 {status}"),
            ));
        }

        let user: Value = response.json().await.map_err(|e| {
            OAuthError::user_info("x", "user_info_failed", format!("用户信息解析失败: {e}"))
        })?;

        let uid = string_field(&user, "id_str")
            .ok_or_else(|| OAuthError::user_info("x", "user_info_failed", "Twitter未返回用户ID"))?;
        let username = string_field(&user, "screen_name").unwrap_or_default();
        let avatar = string_field(&user, "profile_image_url_https")
            .map(|url| url.replace("_normal", ""))
            .unwrap_or_default();

        let raw_email = string_field(&user, "email");
        let (email, email_collection_needed) = normalize_email(raw_email.as_deref());

        Ok(CanonicalIdentity {
            provider: "x".to_string(),
            uid,
            username,
            email,
            avatar,
            email_collection_needed,
        })
    }
}
