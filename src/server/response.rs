//! # API 响应结构
//!
//! 标准 JSON 响应信封。错误响应只携带机器码与人类可读信息，
//! 不含堆栈与任何凭据。

use crate::error::OAuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 标准成功响应
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// 标准错误信息
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub provider: String,
}

/// 标准错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
    pub timestamp: DateTime<Utc>,
}

/// 构造成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            data: Some(data),
            message: Some("操作成功".to_string()),
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}

/// 把 OAuth 错误映射为结构化错误响应
pub fn oauth_error(err: &OAuthError) -> Response {
    let status = match err {
        OAuthError::Configuration { .. } | OAuthError::ProviderNotSupported { .. } => {
            StatusCode::BAD_REQUEST
        }
        OAuthError::StateValidation { .. } => StatusCode::UNAUTHORIZED,
        OAuthError::Token { .. } | OAuthError::UserInfo { .. } => StatusCode::BAD_GATEWAY,
    };

    (
        status,
        Json(ErrorResponse {
            success: false,
            error: ErrorInfo {
                code: err.code().to_string(),
                message: err.to_string(),
                provider: err.provider().to_string(),
            },
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}
