//! # 登录与回调处理器
//!
//! 对外的两个核心操作加上运维观测接口。回调成功把标准身份交给
//! 外围应用层；会话签发不在本服务职责内。

use crate::oauth::service::CallbackParams;
use crate::server::response;
use crate::server::server::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};

/// `GET /oauth/login/{provider}` — 发起登录，302 跳到厂商授权页
pub async fn login(State(state): State<AppState>, Path(provider): Path<String>) -> Response {
    match state.service.login(&provider).await {
        Ok(redirect) => Redirect::temporary(&redirect.redirect_url).into_response(),
        Err(err) => {
            tracing::warn!(
                provider = %provider,
                code = err.code(),
                category = ?err.category(),
                "登录发起失败: {err}"
            );
            response::oauth_error(&err)
        }
    }
}

/// `GET /oauth/callback/{provider}` — 完成回调，返回标准身份
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state.service.callback(&provider, params).await {
        Ok(identity) => response::success(identity),
        Err(err) => {
            tracing::warn!(
                provider = %provider,
                code = err.code(),
                category = ?err.category(),
                "回调处理失败: {err}"
            );
            response::oauth_error(&err)
        }
    }
}

/// `GET /oauth/providers` — 支持的厂商及启用状态
pub async fn providers(State(state): State<AppState>) -> Response {
    response::success(state.service.provider_listing())
}

/// `GET /oauth/states/stats` — state 管理器计数器
pub async fn state_stats(State(state): State<AppState>) -> Response {
    response::success(state.service.state_stats())
}
