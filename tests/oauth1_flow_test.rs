//! 签名请求族（OAuth 1.0a）三腿流程端到端测试
//!
//! 三条腿连起来走：request token → 授权地址拼装 → verifier 换访问令牌
//! 对 → 签名拉取用户信息。上游全部由 wiremock 模拟，每条腿都断言
//! 请求携带了 `Authorization: OAuth ...` 签名头。

use std::time::Duration;
use third_login::oauth::http::build_client;
use third_login::oauth::provider::SignedFlow;
use third_login::oauth::providers::XProvider;
use third_login::oauth::types::{ProtocolFamily, ProviderConfig, ProviderTemplate};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn signed_config(base: &str) -> ProviderConfig {
    ProviderConfig {
        provider_name: "x".to_string(),
        template: ProviderTemplate {
            family: ProtocolFamily::SignedRequest,
            auth_url: format!("{base}/authenticate"),
            token_url: None,
            request_token_url: Some(format!("{base}/request_token")),
            access_token_url: Some(format!("{base}/access_token")),
            user_info_url: format!("{base}/verify_credentials"),
            emails_url: None,
            openid_url: None,
            jwks_url: None,
            issuers: Vec::new(),
            scope: None,
        },
        client_id: "consumer_key".to_string(),
        client_secret: "consumer_secret".to_string(),
        redirect_uri: "https://blog.example.com/oauth/callback/x".to_string(),
        scope: None,
    }
}

fn client() -> reqwest::Client {
    build_client(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn three_leg_flow_end_to_end() {
    let server = MockServer::start().await;

    // 第一腿：request token，表单编码响应
    Mock::given(method("POST"))
        .and(path("/request_token"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=rt1&oauth_token_secret=s1&oauth_callback_confirmed=true"),
        )
        .mount(&server)
        .await;
    // 第三腿：verifier 换访问令牌对
    Mock::given(method("POST"))
        .and(path("/access_token"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=at1&oauth_token_secret=s2&screen_name=someone"),
        )
        .mount(&server)
        .await;
    // 用户信息，同样要求签名头
    Mock::given(method("GET"))
        .and(path("/verify_credentials"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id_str": "9001",
            "screen_name": "someone",
            "email": "someone@example.com",
            "profile_image_url_https": "https://pbs.example.com/avatar_normal.jpg"
        })))
        .mount(&server)
        .await;

    let provider = XProvider::new(signed_config(&server.uri()), client());

    let request_token = provider
        .request_token("https://blog.example.com/oauth/callback/x?state=abc")
        .await
        .unwrap();
    assert_eq!(request_token.token, "rt1");
    assert_eq!(request_token.secret, "s1");

    let auth_url = provider.build_auth_url(&request_token.token).unwrap();
    assert!(auth_url.starts_with(&format!("{}/authenticate", server.uri())));
    assert!(auth_url.contains("oauth_token=rt1"));

    let bundle = provider
        .exchange_verifier(&request_token.token, &request_token.secret, "v1")
        .await
        .unwrap();
    assert_eq!(bundle.access_token(), "at1");

    let identity = provider
        .fetch_user_info("at1", Some("s2"))
        .await
        .unwrap();
    assert_eq!(identity.provider, "x");
    assert_eq!(identity.uid, "9001");
    assert_eq!(identity.username, "someone");
    assert_eq!(identity.email, "someone@example.com");
    assert!(!identity.email_collection_needed);
    // 头像去掉 _normal 后缀取原图
    assert_eq!(identity.avatar, "https://pbs.example.com/avatar.jpg");
}

#[tokio::test]
async fn missing_token_secret_cannot_sign() {
    let server = MockServer::start().await;
    let provider = XProvider::new(signed_config(&server.uri()), client());

    let err = provider.fetch_user_info("at1", None).await.unwrap_err();
    assert_eq!(err.code(), "missing_token_secret");
    assert_eq!(err.provider(), "x");
}

#[tokio::test]
async fn request_token_leg_rejects_incomplete_response() {
    let server = MockServer::start().await;
    // 缺少 oauth_token_secret 的响应不可用
    Mock::given(method("POST"))
        .and(path("/request_token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("oauth_token=rt1"))
        .mount(&server)
        .await;

    let provider = XProvider::new(signed_config(&server.uri()), client());
    let err = provider
        .request_token("https://blog.example.com/oauth/callback/x")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "no_request_token");
}

#[tokio::test]
async fn denied_access_token_leg_surfaces_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/access_token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let provider = XProvider::new(signed_config(&server.uri()), client());
    let err = provider.exchange_verifier("rt1", "s1", "bad").await.unwrap_err();
    assert_eq!(err.code(), "access_token_failed");
}
