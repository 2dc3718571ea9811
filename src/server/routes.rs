//! # 路由配置

use crate::server::handlers;
use crate::server::server::{health_check, AppState};
use axum::routing::get;
use axum::Router;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .nest("/oauth", oauth_routes())
        .route("/health", get(health_check))
        .with_state(state)
}

fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/login/{provider}", get(handlers::oauth::login))
        .route("/callback/{provider}", get(handlers::oauth::callback))
        .route("/providers", get(handlers::oauth::providers))
        .route("/states/stats", get(handlers::oauth::state_stats))
}
