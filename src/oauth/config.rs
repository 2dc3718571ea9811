//! # 提供商配置解析
//!
//! 将静态协议模板与外部配置缓存中的运营方凭据合并为完整的
//! [`ProviderConfig`]。凭据缺失按"未配置"处理并失败关闭，
//! 报错时一次性列出全部缺失字段。

use crate::config::settings::SettingsSource;
use crate::error::{OAuthError, Result};
use crate::oauth::templates::ProviderTemplates;
use crate::oauth::types::{ProtocolFamily, ProviderConfig};
use serde_json::Value;
use std::sync::Arc;

/// 外部配置缓存中第三方登录配置的对象名
const SETTINGS_KEY: &str = "third_login";

/// 提供商配置管理器
pub struct ConfigManager {
    templates: ProviderTemplates,
    settings: Arc<dyn SettingsSource>,
    /// 覆盖缺省时使用的回调基地址
    redirect_base: String,
}

impl ConfigManager {
    pub fn new(
        templates: ProviderTemplates,
        settings: Arc<dyn SettingsSource>,
        redirect_base: impl Into<String>,
    ) -> Self {
        Self {
            templates,
            settings,
            redirect_base: redirect_base.into(),
        }
    }

    /// 解析提供商的生效配置
    ///
    /// 模板缺失报 `ProviderNotSupported`；凭据不完整报 `Configuration`，
    /// 错误信息列出全部缺失字段而非第一个。
    pub fn resolve(&self, provider: &str) -> Result<ProviderConfig> {
        let template = self
            .templates
            .get(provider)
            .ok_or_else(|| OAuthError::provider_not_supported(provider))?;

        let overlay = self.dynamic_overlay(provider);

        // 签名请求族用 consumer key/secret，其余用 client id/secret
        let required: [&str; 2] = match template.family {
            ProtocolFamily::SignedRequest => ["client_key", "client_secret"],
            ProtocolFamily::AuthorizationCode => ["client_id", "client_secret"],
        };

        let missing: Vec<&str> = required
            .iter()
            .filter(|field| Self::string_field(overlay.as_ref(), field).is_none())
            .copied()
            .collect();

        if !missing.is_empty() {
            return Err(OAuthError::configuration(
                provider,
                "incomplete_config",
                format!("{}配置不完整，缺少字段: {}", provider, missing.join(", ")),
            ));
        }

        let overlay = overlay.as_ref();
        let client_id = Self::string_field(overlay, required[0])
            .unwrap_or_default();
        let client_secret = Self::string_field(overlay, "client_secret")
            .unwrap_or_default();
        let redirect_uri = Self::string_field(overlay, "redirect_uri").unwrap_or_else(|| {
            format!(
                "{}/oauth/callback/{}",
                self.redirect_base.trim_end_matches('/'),
                provider
            )
        });
        let scope =
            Self::string_field(overlay, "scope").or_else(|| template.scope.clone());

        Ok(ProviderConfig {
            provider_name: provider.to_string(),
            template: template.clone(),
            client_id,
            client_secret,
            redirect_uri,
            scope,
        })
    }

    /// 提供商是否已启用（即 resolve 能成功）
    pub fn is_enabled(&self, provider: &str) -> bool {
        self.resolve(provider).is_ok()
    }

    /// 编译期已知的提供商集合，与运营配置状态无关
    pub fn supported_providers(&self) -> Vec<String> {
        self.templates.provider_names()
    }

    /// 取动态凭据层
    ///
    /// 配置对象缺失、全局 `enable=false`、或该提供商 `enabled=false`
    /// 都视为"没有凭据"而非错误。
    fn dynamic_overlay(&self, provider: &str) -> Option<Value> {
        let root = self.settings.fetch(SETTINGS_KEY)?;
        if !root.get("enable").and_then(Value::as_bool).unwrap_or(false) {
            return None;
        }
        let section = root.get(provider)?;
        if !section
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(true)
        {
            return None;
        }
        Some(section.clone())
    }

    /// 取非空字符串字段
    fn string_field(overlay: Option<&Value>, field: &str) -> Option<String> {
        overlay?
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::StaticSettings;
    use serde_json::json;

    fn manager_with(settings: Value) -> ConfigManager {
        ConfigManager::new(
            ProviderTemplates::builtin(),
            Arc::new(StaticSettings::new(settings)),
            "https://blog.example.com",
        )
    }

    #[test]
    fn test_resolve_merges_template_and_overlay() {
        let manager = manager_with(json!({
            "third_login": {
                "enable": true,
                "github": {
                    "client_id": "gh_id",
                    "client_secret": "gh_secret",
                    "redirect_uri": "https://blog.example.com/cb"
                }
            }
        }));

        let config = manager.resolve("github").unwrap();
        assert_eq!(config.client_id, "gh_id");
        assert_eq!(config.redirect_uri, "https://blog.example.com/cb");
        assert_eq!(config.scope.as_deref(), Some("user:email"));
        assert_eq!(
            config.template.auth_url,
            "https://github.com/login/oauth/authorize"
        );
    }

    #[test]
    fn test_resolve_unknown_vendor() {
        let manager = manager_with(json!({}));
        let err = manager.resolve("unknownvendor").unwrap_err();
        assert!(matches!(err, OAuthError::ProviderNotSupported { .. }));
    }

    #[test]
    fn test_resolve_lists_every_missing_field() {
        let manager = manager_with(json!({
            "third_login": {"enable": true, "google": {}}
        }));
        let err = manager.resolve("google").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("client_id"));
        assert!(message.contains("client_secret"));
        assert_eq!(err.code(), "incomplete_config");
    }

    #[test]
    fn test_signed_request_family_requires_consumer_pair() {
        let manager = manager_with(json!({
            "third_login": {"enable": true, "x": {"client_id": "wrong_field"}}
        }));
        let err = manager.resolve("x").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("client_key"));
        assert!(message.contains("client_secret"));
    }

    #[test]
    fn test_global_disable_means_no_credentials() {
        let manager = manager_with(json!({
            "third_login": {
                "enable": false,
                "github": {"client_id": "id", "client_secret": "secret"}
            }
        }));
        assert!(!manager.is_enabled("github"));
    }

    #[test]
    fn test_per_provider_disable_means_no_credentials() {
        let manager = manager_with(json!({
            "third_login": {
                "enable": true,
                "gitee": {"enabled": false, "client_id": "id", "client_secret": "secret"}
            }
        }));
        assert!(!manager.is_enabled("gitee"));
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let manager = manager_with(json!({
            "third_login": {
                "enable": true,
                "yandex": {"client_id": "", "client_secret": "secret"}
            }
        }));
        let err = manager.resolve("yandex").unwrap_err();
        assert!(err.to_string().contains("client_id"));
        assert!(!err.to_string().contains("client_secret"));
    }

    #[test]
    fn test_supported_providers_reflects_templates_not_credentials() {
        let manager = manager_with(json!({}));
        let supported = manager.supported_providers();
        assert!(supported.contains(&"qq".to_string()));
        assert!(!manager.is_enabled("qq"));
    }

    #[test]
    fn test_default_redirect_uri_from_base() {
        let manager = manager_with(json!({
            "third_login": {
                "enable": true,
                "qq": {"client_id": "id", "client_secret": "secret"}
            }
        }));
        let config = manager.resolve("qq").unwrap();
        assert_eq!(
            config.redirect_uri,
            "https://blog.example.com/oauth/callback/qq"
        );
    }
}
