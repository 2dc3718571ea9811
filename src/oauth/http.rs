//! # 上游 HTTP 公共设施
//!
//! 共享的 reqwest 客户端与各家响应编码的容错解析：
//! 标准 JSON、`k=v&k=v` 表单文本（github / qq 的令牌端点）、
//! 以及 JSONP 回调包装（qq 的 openid 端点）。

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

/// 构建共享 HTTP 客户端，所有上游请求统一超时
pub fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("third-login/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| anyhow::anyhow!("构建HTTP客户端失败: {}", e))
}

/// 解析令牌响应体，JSON 与表单编码两种形状都接受
///
/// 先按 JSON 解析；失败则按 `k=v&k=v` 表单文本拆解成同构的 JSON 对象，
/// 两种形状产出一致的字段视图。
pub fn parse_token_body(body: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if value.is_object() {
            return value;
        }
    }

    let mut map = Map::new();
    for (key, value) in form_pairs(body) {
        map.insert(key, Value::String(value));
    }
    Value::Object(map)
}

/// 拆解表单编码文本，含百分号解码
pub fn form_pairs(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

/// 剥掉 JSONP 回调包装
///
/// `callback( {...} );` 与 `callback({...})` 都要能剥；括号前必须是
/// 裸回调标识符，字符串值里带括号的普通 JSON 原样返回。
pub fn unwrap_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(open) = trimmed.find('(') else {
        return trimmed;
    };
    let prefix = &trimmed[..open];
    if prefix.is_empty()
        || !prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        return trimmed;
    }
    let Some(close) = trimmed.rfind(')') else {
        return trimmed;
    };
    if close <= open {
        return trimmed;
    }
    trimmed[open + 1..close].trim()
}

/// 从 JSON 对象中取非空字符串字段
pub fn string_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
