//! # 提供商工厂
//!
//! 名称到已配置提供商实例的唯一解析点。新增厂商只需在配置模板里
//! 加一条、在 providers 下加一个模块，然后在这里登记一行。

use crate::error::{OAuthError, Result};
use crate::oauth::config::ConfigManager;
use crate::oauth::jwks::JwksCache;
use crate::oauth::provider::OAuthProvider;
use crate::oauth::providers::{
    GiteeProvider, GithubProvider, GoogleProvider, QqProvider, XProvider, YandexProvider,
};
use std::sync::Arc;

/// 提供商工厂
pub struct ProviderFactory {
    config_manager: Arc<ConfigManager>,
    client: reqwest::Client,
    jwks: Arc<JwksCache>,
}

impl ProviderFactory {
    pub fn new(
        config_manager: Arc<ConfigManager>,
        client: reqwest::Client,
        jwks: Arc<JwksCache>,
    ) -> Self {
        Self {
            config_manager,
            client,
            jwks,
        }
    }

    /// 构造已配置的提供商实例
    ///
    /// 未知名称在任何网络调用之前即以 `ProviderNotSupported` 失败；
    /// 凭据不完整以 `Configuration` 失败。
    pub fn create(&self, provider: &str) -> Result<OAuthProvider> {
        let config = self.config_manager.resolve(provider)?;
        let client = self.client.clone();

        let constructed = match provider {
            "github" => OAuthProvider::Code(Box::new(GithubProvider::new(config, client))),
            "google" => OAuthProvider::Code(Box::new(GoogleProvider::new(
                config,
                client,
                Arc::clone(&self.jwks),
            ))),
            "yandex" => OAuthProvider::Code(Box::new(YandexProvider::new(config, client))),
            "gitee" => OAuthProvider::Code(Box::new(GiteeProvider::new(config, client))),
            "qq" => OAuthProvider::Code(Box::new(QqProvider::new(config, client))),
            "x" => OAuthProvider::Signed(Box::new(XProvider::new(config, client))),
            // 模板已注册但还没有对应实现
            other => return Err(OAuthError::provider_not_supported(other)),
        };

        Ok(constructed)
    }

    /// 配置管理器句柄，供列表类接口复用
    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }
}
