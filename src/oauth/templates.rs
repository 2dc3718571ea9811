//! # 提供商协议模板
//!
//! 编译期已知的各家端点形状。注册表构建完成后不可变，
//! 新增厂商只能在构建阶段（共享之前）通过 [`ProviderTemplates::register`] 加入，
//! 与查询并发的变更是不存在的。

use crate::oauth::types::{ProtocolFamily, ProviderTemplate};
use std::collections::BTreeMap;

/// 不可变的提供商模板注册表
#[derive(Debug)]
pub struct ProviderTemplates {
    map: BTreeMap<String, ProviderTemplate>,
}

impl ProviderTemplates {
    /// 内建厂商集合
    pub fn builtin() -> Self {
        let mut templates = Self {
            map: BTreeMap::new(),
        };

        templates.register("github", ProviderTemplate {
            family: ProtocolFamily::AuthorizationCode,
            auth_url: "https://github.com/login/oauth/authorize".into(),
            token_url: Some("https://github.com/login/oauth/access_token".into()),
            request_token_url: None,
            access_token_url: None,
            user_info_url: "https://api.github.com/user".into(),
            emails_url: Some("https://api.github.com/user/emails".into()),
            openid_url: None,
            jwks_url: None,
            issuers: Vec::new(),
            scope: Some("user:email".into()),
        });

        templates.register("google", ProviderTemplate {
            family: ProtocolFamily::AuthorizationCode,
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token_url: Some("https://oauth2.googleapis.com/token".into()),
            request_token_url: None,
            access_token_url: None,
            user_info_url: "https://people.googleapis.com/v1/people/me".into(),
            emails_url: None,
            openid_url: None,
            jwks_url: Some("https://www.googleapis.com/oauth2/v3/certs".into()),
            issuers: vec![
                "accounts.google.com".into(),
                "https://accounts.google.com".into(),
            ],
            scope: Some("openid email profile".into()),
        });

        templates.register("yandex", ProviderTemplate {
            family: ProtocolFamily::AuthorizationCode,
            auth_url: "https://oauth.yandex.com/authorize".into(),
            token_url: Some("https://oauth.yandex.com/token".into()),
            request_token_url: None,
            access_token_url: None,
            user_info_url: "https://login.yandex.ru/info".into(),
            emails_url: None,
            openid_url: None,
            jwks_url: None,
            issuers: Vec::new(),
            scope: Some("login:email login:info".into()),
        });

        templates.register("gitee", ProviderTemplate {
            family: ProtocolFamily::AuthorizationCode,
            auth_url: "https://gitee.com/oauth/authorize".into(),
            token_url: Some("https://gitee.com/oauth/token".into()),
            request_token_url: None,
            access_token_url: None,
            user_info_url: "https://gitee.com/api/v5/user".into(),
            emails_url: Some("https://gitee.com/api/v5/emails".into()),
            openid_url: None,
            jwks_url: None,
            issuers: Vec::new(),
            scope: Some("user_info emails".into()),
        });

        templates.register("qq", ProviderTemplate {
            family: ProtocolFamily::AuthorizationCode,
            auth_url: "https://graph.qq.com/oauth2.0/authorize".into(),
            token_url: Some("https://graph.qq.com/oauth2.0/token".into()),
            request_token_url: None,
            access_token_url: None,
            user_info_url: "https://graph.qq.com/user/get_user_info".into(),
            emails_url: None,
            openid_url: Some("https://graph.qq.com/oauth2.0/me".into()),
            jwks_url: None,
            issuers: Vec::new(),
            scope: Some("get_user_info".into()),
        });

        templates.register("x", ProviderTemplate {
            family: ProtocolFamily::SignedRequest,
            auth_url: "https://api.twitter.com/oauth/authenticate".into(),
            token_url: None,
            request_token_url: Some("https://api.twitter.com/oauth/request_token".into()),
            access_token_url: Some("https://api.twitter.com/oauth/access_token".into()),
            user_info_url: "https://api.twitter.com/1.1/account/verify_credentials.json".into(),
            emails_url: None,
            openid_url: None,
            jwks_url: None,
            issuers: Vec::new(),
            scope: None,
        });

        templates
    }

    /// 注册模板，仅限构建阶段调用
    pub fn register(&mut self, provider: &str, template: ProviderTemplate) {
        self.map.insert(provider.to_string(), template);
    }

    /// 查询模板
    pub fn get(&self, provider: &str) -> Option<&ProviderTemplate> {
        self.map.get(provider)
    }

    /// 全部已知厂商名
    pub fn provider_names(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_all_vendors() {
        let templates = ProviderTemplates::builtin();
        let names = templates.provider_names();
        for vendor in ["github", "google", "yandex", "gitee", "qq", "x"] {
            assert!(names.contains(&vendor.to_string()), "缺少 {vendor}");
        }
    }

    #[test]
    fn test_x_is_signed_request_family() {
        let templates = ProviderTemplates::builtin();
        let x = templates.get("x").unwrap();
        assert_eq!(x.family, ProtocolFamily::SignedRequest);
        assert!(x.request_token_url.is_some());
        assert!(x.access_token_url.is_some());
        assert!(x.token_url.is_none());
    }

    #[test]
    fn test_register_custom_vendor_during_build_phase() {
        let mut templates = ProviderTemplates::builtin();
        templates.register("acme", ProviderTemplate {
            family: ProtocolFamily::AuthorizationCode,
            auth_url: "https://acme.test/authorize".into(),
            token_url: Some("https://acme.test/token".into()),
            request_token_url: None,
            access_token_url: None,
            user_info_url: "https://acme.test/me".into(),
            emails_url: None,
            openid_url: None,
            jwks_url: None,
            issuers: Vec::new(),
            scope: None,
        });
        assert!(templates.get("acme").is_some());
    }
}
