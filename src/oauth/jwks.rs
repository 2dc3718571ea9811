//! # 签名密钥集缓存与 id_token 校验
//!
//! google 的身份令牌是可验证的签名断言：取厂商当前密钥集、按 `kid`
//! 匹配、校验签发方与受众之后才能信任其中的声明。密钥集走共享异步
//! 客户端获取并带独立有效期缓存，不在每次登录时重新拉取；遇到未知
//! `kid` 时强制刷新一次（密钥轮换场景）。

use crate::error::{OAuthError, Result};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// 密钥集缓存有效期
const JWKS_TTL: Duration = Duration::from_secs(3600);

/// 校验通过的 id_token 声明
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    /// 厂商命名空间内的用户唯一标识
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// 带过期的 JWKS 缓存
pub struct JwksCache {
    client: reqwest::Client,
    ttl: Duration,
    cached: RwLock<Option<CachedKeys>>,
}

impl JwksCache {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            ttl: JWKS_TTL,
            cached: RwLock::new(None),
        }
    }

    /// 校验 id_token 并返回其声明
    ///
    /// 只接受 RS256；`kid` 必须能在密钥集中找到；签发方与受众
    /// 不符即失败。未通过校验前不返回任何声明字段。
    pub async fn verify_id_token(
        &self,
        provider: &str,
        jwks_url: &str,
        id_token: &str,
        audience: &str,
        issuers: &[String],
    ) -> Result<IdTokenClaims> {
        let header = decode_header(id_token).map_err(|e| {
            OAuthError::user_info(provider, "invalid_id_token", format!("id_token头解析失败: {e}"))
        })?;
        let kid = header.kid.ok_or_else(|| {
            OAuthError::user_info(provider, "invalid_id_token", "id_token缺少kid")
        })?;

        let jwk = match self.find_key(provider, jwks_url, &kid, false).await? {
            Some(jwk) => jwk,
            // 未知 kid：密钥可能刚轮换，强制刷新后再找一次
            None => self
                .find_key(provider, jwks_url, &kid, true)
                .await?
                .ok_or_else(|| {
                    OAuthError::user_info(
                        provider,
                        "unknown_signing_key",
                        format!("密钥集中找不到kid: {kid}"),
                    )
                })?,
        };

        let decoding_key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            OAuthError::user_info(provider, "invalid_signing_key", format!("签名密钥无效: {e}"))
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(issuers);

        let data = decode::<IdTokenClaims>(id_token, &decoding_key, &validation).map_err(|e| {
            OAuthError::user_info(provider, "id_token_rejected", format!("id_token校验未通过: {e}"))
        })?;

        Ok(data.claims)
    }

    /// 在（必要时刷新的）密钥集中查找 kid
    async fn find_key(
        &self,
        provider: &str,
        jwks_url: &str,
        kid: &str,
        force_refresh: bool,
    ) -> Result<Option<jsonwebtoken::jwk::Jwk>> {
        if !force_refresh {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                if entry.fetched_at.elapsed() < self.ttl {
                    return Ok(entry.keys.find(kid).cloned());
                }
            }
        }

        let keys = self.fetch_keys(provider, jwks_url).await?;
        let found = keys.find(kid).cloned();
        let mut cached = self.cached.write().await;
        *cached = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        Ok(found)
    }

    async fn fetch_keys(&self, provider: &str, jwks_url: &str) -> Result<JwkSet> {
        let response = self.client.get(jwks_url).send().await.map_err(|e| {
            OAuthError::user_info(provider, "jwks_fetch_failed", format!("获取密钥集失败: {e}"))
        })?;
        response.json::<JwkSet>().await.map_err(|e| {
            OAuthError::user_info(provider, "jwks_fetch_failed", format!("密钥集解析失败: {e}"))
        })
    }
}
