//! # 登录编排
//!
//! 把工厂、state 管理与两个协议变体串成对外的两个操作：
//! 发起登录（返回跳转地址）与完成回调（返回标准身份）。
//! 配置类失败发生在签发 state 之前；state 一经消费便永久作废，
//! 之后的失败只能从头再来。

use crate::error::{OAuthError, Result};
use crate::oauth::factory::ProviderFactory;
use crate::oauth::provider::OAuthProvider;
use crate::oauth::state::StateManager;
use crate::oauth::types::{CanonicalIdentity, TokenBundle};
use serde::Deserialize;
use std::sync::Arc;

/// 回调查询参数，两个协议族的字段并在一起
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// 授权码（授权码族）
    pub code: Option<String>,
    /// 回显的 state
    pub state: Option<String>,
    /// request token（签名请求族）
    pub oauth_token: Option<String>,
    /// verifier（签名请求族）
    pub oauth_verifier: Option<String>,
}

/// 登录发起的产物
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub provider: String,
    pub redirect_url: String,
}

/// 登录编排服务
pub struct OAuthService {
    factory: ProviderFactory,
    states: Arc<StateManager>,
    /// 回调基地址，签名请求族把 state 挂在回调地址上
    redirect_base: String,
}

impl OAuthService {
    pub fn new(
        factory: ProviderFactory,
        states: Arc<StateManager>,
        redirect_base: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            states,
            redirect_base: redirect_base.into(),
        }
    }

    /// 发起登录，返回指向厂商授权页的跳转地址
    pub async fn login(&self, provider_name: &str) -> Result<LoginRedirect> {
        // 配置解析失败在这里返回，尚未签发任何 state
        let provider = self.factory.create(provider_name)?;

        let redirect_url = match &provider {
            OAuthProvider::Code(flow) => {
                let state = self.states.issue(provider_name, None);
                match flow.build_auth_url(&state) {
                    Ok(url) => url,
                    Err(e) => {
                        // 地址拼装失败，回收刚签发的 state
                        self.states.discard(&state);
                        return Err(e);
                    }
                }
            }
            OAuthProvider::Signed(flow) => {
                // 厂商不回显 state，挂在注册的回调地址上带回来
                let state = self.states.issue(provider_name, None);
                let callback_uri = format!(
                    "{}/oauth/callback/{}?state={}",
                    self.redirect_base.trim_end_matches('/'),
                    provider_name,
                    state
                );

                let request_token = match flow.request_token(&callback_uri).await {
                    Ok(request_token) => request_token,
                    Err(e) => {
                        // 第一腿失败，回收刚签发的 state
                        self.states.discard(&state);
                        return Err(e);
                    }
                };
                self.states.bind_secret(&state, &request_token.secret)?;
                match flow.build_auth_url(&request_token.token) {
                    Ok(url) => url,
                    Err(e) => {
                        self.states.discard(&state);
                        return Err(e);
                    }
                }
            }
        };

        tracing::info!(provider = provider_name, "第三方登录发起");
        Ok(LoginRedirect {
            provider: provider_name.to_string(),
            redirect_url,
        })
    }

    /// 完成回调：校验 state、驱动令牌交换与用户信息获取
    pub async fn callback(
        &self,
        provider_name: &str,
        params: CallbackParams,
    ) -> Result<CanonicalIdentity> {
        let provider = self.factory.create(provider_name)?;

        let state_token = params.state.as_deref().ok_or_else(|| {
            OAuthError::state_validation(provider_name, "missing_state", "回调缺少state参数")
        })?;
        let login_state = self.states.consume(state_token)?;
        if login_state.provider != provider_name {
            return Err(OAuthError::state_validation(
                provider_name,
                "provider_mismatch",
                "state与提供商不匹配",
            ));
        }

        let identity = match &provider {
            OAuthProvider::Code(flow) => {
                let code = params.code.as_deref().ok_or_else(|| {
                    OAuthError::token(provider_name, "missing_code", "回调缺少授权码")
                })?;
                let bundle = flow.exchange_code(code).await?;
                flow.fetch_user_info(&bundle).await?
            }
            OAuthProvider::Signed(flow) => {
                let oauth_token = params.oauth_token.as_deref().ok_or_else(|| {
                    OAuthError::token(provider_name, "missing_oauth_token", "回调缺少oauth_token")
                })?;
                let verifier = params.oauth_verifier.as_deref().ok_or_else(|| {
                    OAuthError::token(provider_name, "missing_verifier", "回调缺少oauth_verifier")
                })?;
                let request_secret = login_state.request_secret.as_deref().ok_or_else(|| {
                    OAuthError::state_validation(
                        provider_name,
                        "missing_request_secret",
                        "state中缺少request token secret",
                    )
                })?;

                let bundle = flow
                    .exchange_verifier(oauth_token, request_secret, verifier)
                    .await?;
                let TokenBundle::Signed {
                    access_token,
                    access_token_secret,
                } = bundle
                else {
                    return Err(OAuthError::token(
                        provider_name,
                        "token_shape_mismatch",
                        "令牌类型与协议族不匹配",
                    ));
                };
                flow.fetch_user_info(&access_token, Some(&access_token_secret))
                    .await?
            }
        };

        tracing::info!(
            provider = provider_name,
            uid = %identity.uid,
            email_collection_needed = identity.email_collection_needed,
            "第三方登录完成"
        );
        Ok(identity)
    }

    /// state 计数器快照
    pub fn state_stats(&self) -> crate::oauth::state::StateStats {
        self.states.stats()
    }

    /// 编译期支持与当前启用的提供商列表
    pub fn provider_listing(&self) -> Vec<ProviderStatus> {
        let manager = self.factory.config_manager();
        manager
            .supported_providers()
            .into_iter()
            .map(|name| {
                let enabled = manager.is_enabled(&name);
                ProviderStatus { name, enabled }
            })
            .collect()
    }
}

/// 提供商启用状态
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub enabled: bool,
}
