//! 登录编排服务集成测试
//!
//! 通过注册指向 wiremock 的自定义模板，把 github 的完整一次登录
//! （发起 → state 回显 → 回调换取标准身份）走通，并覆盖 state
//! 单次生效与提供商错配两种拒绝路径。

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use third_login::config::settings::StaticSettings;
use third_login::oauth::config::ConfigManager;
use third_login::oauth::factory::ProviderFactory;
use third_login::oauth::http::build_client;
use third_login::oauth::jwks::JwksCache;
use third_login::oauth::state::StateManager;
use third_login::oauth::templates::ProviderTemplates;
use third_login::oauth::types::{ProtocolFamily, ProviderTemplate};
use third_login::oauth::{CallbackParams, OAuthService};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_with(base: &str) -> OAuthService {
    let mut templates = ProviderTemplates::builtin();
    templates.register(
        "github",
        ProviderTemplate {
            family: ProtocolFamily::AuthorizationCode,
            auth_url: format!("{base}/authorize"),
            token_url: Some(format!("{base}/token")),
            request_token_url: None,
            access_token_url: None,
            user_info_url: format!("{base}/user"),
            emails_url: Some(format!("{base}/emails")),
            openid_url: None,
            jwks_url: None,
            issuers: Vec::new(),
            scope: Some("user:email".to_string()),
        },
    );

    let settings = Arc::new(StaticSettings::new(json!({
        "third_login": {
            "enable": true,
            "github": {"client_id": "cid", "client_secret": "csecret"},
            "yandex": {"client_id": "ya_cid", "client_secret": "ya_csecret"}
        }
    })));
    let config_manager = Arc::new(ConfigManager::new(
        templates,
        settings,
        "https://blog.example.com",
    ));
    let client = build_client(Duration::from_secs(5)).unwrap();
    let jwks = Arc::new(JwksCache::new(client.clone()));
    let factory = ProviderFactory::new(config_manager, client, jwks);
    let states = Arc::new(StateManager::new(Duration::from_secs(300)));
    OAuthService::new(factory, states, "https://blog.example.com")
}

fn extract_state(redirect_url: &str) -> String {
    let url = url::Url::parse(redirect_url).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

#[tokio::test]
async fn full_login_roundtrip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("access_token=at1&token_type=bearer"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "login": "octo",
            "email": "octo@example.com",
            "avatar_url": "https://avatars.example.com/7"
        })))
        .mount(&server)
        .await;

    let service = service_with(&server.uri());

    let redirect = service.login("github").await.unwrap();
    assert_eq!(redirect.provider, "github");
    assert!(redirect
        .redirect_url
        .starts_with(&format!("{}/authorize", server.uri())));
    let state = extract_state(&redirect.redirect_url);
    assert_eq!(state.len(), 32);

    let identity = service
        .callback(
            "github",
            CallbackParams {
                code: Some("c1".to_string()),
                state: Some(state.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(identity.provider, "github");
    assert_eq!(identity.uid, "7");
    assert_eq!(identity.email, "octo@example.com");

    // state 单次生效，重放同一回调被拒
    let err = service
        .callback(
            "github",
            CallbackParams {
                code: Some("c1".to_string()),
                state: Some(state),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_state");

    let stats = service.state_stats();
    assert_eq!(stats.issued, 1);
    assert_eq!(stats.consumed, 1);
    assert_eq!(stats.rejected, 1);
}

#[tokio::test]
async fn callback_without_state_is_rejected() {
    let server = MockServer::start().await;
    let service = service_with(&server.uri());

    let err = service
        .callback(
            "github",
            CallbackParams {
                code: Some("c1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "missing_state");
}

#[tokio::test]
async fn state_bound_to_issuing_provider() {
    let server = MockServer::start().await;
    let service = service_with(&server.uri());

    // 为 github 签发的 state 拿去回调 yandex
    let redirect = service.login("github").await.unwrap();
    let state = extract_state(&redirect.redirect_url);

    let err = service
        .callback(
            "yandex",
            CallbackParams {
                code: Some("c1".to_string()),
                state: Some(state.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "provider_mismatch");

    // 错配尝试已经消费掉该 state，拿回正确提供商也无法复用
    let err = service
        .callback(
            "github",
            CallbackParams {
                code: Some("c1".to_string()),
                state: Some(state),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_state");
}

#[tokio::test]
async fn upstream_token_failure_after_consume_is_unretryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = service_with(&server.uri());
    let redirect = service.login("github").await.unwrap();
    let state = extract_state(&redirect.redirect_url);

    let err = service
        .callback(
            "github",
            CallbackParams {
                code: Some("c1".to_string()),
                state: Some(state.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "token_request_failed");

    // state 已被消费，重试同一 state 只会拿到 invalid_state
    let err = service
        .callback(
            "github",
            CallbackParams {
                code: Some("c1".to_string()),
                state: Some(state),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_state");
}

#[tokio::test]
async fn provider_listing_reflects_overlay() {
    let server = MockServer::start().await;
    let service = service_with(&server.uri());

    let listing = service.provider_listing();
    // builtin 模板全部列出，只有配置过的厂商处于启用状态
    assert!(listing.len() >= 6);
    let github = listing.iter().find(|p| p.name == "github").unwrap();
    assert!(github.enabled);
    let yandex = listing.iter().find(|p| p.name == "yandex").unwrap();
    assert!(yandex.enabled);
    let qq = listing.iter().find(|p| p.name == "qq").unwrap();
    assert!(!qq.enabled);
}

#[tokio::test]
async fn failed_auth_url_build_does_not_leak_state() {
    let mut templates = ProviderTemplates::builtin();
    // 授权地址无法解析，登录发起在拼装阶段失败
    templates.register(
        "github",
        ProviderTemplate {
            family: ProtocolFamily::AuthorizationCode,
            auth_url: "not a valid url".to_string(),
            token_url: Some("https://example.com/token".to_string()),
            request_token_url: None,
            access_token_url: None,
            user_info_url: "https://example.com/user".to_string(),
            emails_url: None,
            openid_url: None,
            jwks_url: None,
            issuers: Vec::new(),
            scope: None,
        },
    );
    let settings = Arc::new(StaticSettings::new(json!({
        "third_login": {
            "enable": true,
            "github": {"client_id": "cid", "client_secret": "csecret"}
        }
    })));
    let config_manager = Arc::new(ConfigManager::new(
        templates,
        settings,
        "https://blog.example.com",
    ));
    let client = build_client(Duration::from_secs(5)).unwrap();
    let jwks = Arc::new(JwksCache::new(client.clone()));
    let factory = ProviderFactory::new(config_manager, client, jwks);
    let states = Arc::new(StateManager::new(Duration::from_secs(300)));
    let service = OAuthService::new(factory, states, "https://blog.example.com");

    let err = service.login("github").await.unwrap_err();
    assert_eq!(err.code(), "invalid_auth_url");

    // 失败的发起不留下悬挂的 state 条目
    let stats = service.state_stats();
    assert_eq!(stats.pending, 0);
}
