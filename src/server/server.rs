//! # 服务装配与启动
//!
//! 把配置、state 管理、工厂与编排服务装配成共享应用状态，
//! 挂上路由后跑 axum 服务。

use crate::config::settings::JsonFileSettings;
use crate::config::AppConfig;
use crate::oauth::config::ConfigManager;
use crate::oauth::factory::ProviderFactory;
use crate::oauth::jwks::JwksCache;
use crate::oauth::service::OAuthService;
use crate::oauth::state::StateManager;
use crate::oauth::templates::ProviderTemplates;
use crate::server::routes::create_routes;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// state 清理周期
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// 共享应用状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OAuthService>,
}

/// 装配应用状态
pub fn build_state(config: &AppConfig) -> anyhow::Result<(AppState, Arc<StateManager>)> {
    let settings = Arc::new(JsonFileSettings::load(&config.settings_path)?);
    let config_manager = Arc::new(ConfigManager::new(
        ProviderTemplates::builtin(),
        settings,
        config.redirect_base.clone(),
    ));

    let client = crate::oauth::http::build_client(config.http_timeout())?;
    let jwks = Arc::new(JwksCache::new(client.clone()));
    let states = Arc::new(StateManager::new(config.state_ttl()));

    let factory = ProviderFactory::new(config_manager, client, jwks);
    let service = Arc::new(OAuthService::new(
        factory,
        Arc::clone(&states),
        config.redirect_base.clone(),
    ));

    Ok((AppState { service }, states))
}

/// 启动服务，阻塞直到退出
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let (state, states) = build_state(&config)?;
    states.spawn_cleanup_task(CLEANUP_INTERVAL);

    let app = create_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("绑定 {addr} 失败: {e}"))?;
    tracing::info!(addr = %addr, "第三方登录服务启动");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("服务运行失败: {e}"))?;
    Ok(())
}

/// `GET /health` — 存活探测
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "third-login",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
