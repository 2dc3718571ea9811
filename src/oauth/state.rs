//! # 登录 state 管理
//!
//! 签发并消费一次性的、有有效期的不透明 state 令牌，把一次登录发起
//! 与之后的回调绑定在一起，抵御 CSRF 与重放。`consume` 基于
//! `DashMap::remove` 的原子"查删一体"，并发的重复回调投递最多只有
//! 一个能成功。

use crate::error::{OAuthError, Result};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// state 令牌长度
const STATE_TOKEN_LEN: usize = 32;

/// state 令牌对应的登录上下文
#[derive(Debug, Clone)]
pub struct LoginState {
    /// 发起登录的提供商
    pub provider: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// 签名请求族第一腿的 request token secret，回调时换取访问令牌要用
    pub request_secret: Option<String>,
}

impl LoginState {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// 聚合计数器快照，仅做运维观测
#[derive(Debug, Clone, Serialize)]
pub struct StateStats {
    pub issued: u64,
    pub consumed: u64,
    pub expired: u64,
    pub rejected: u64,
    /// 当前仍在存储中的条目数
    pub pending: usize,
}

/// state 管理器
pub struct StateManager {
    store: DashMap<String, LoginState>,
    ttl: Duration,
    issued: AtomicU64,
    consumed: AtomicU64,
    expired: AtomicU64,
    rejected: AtomicU64,
}

impl StateManager {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(300)),
            issued: AtomicU64::new(0),
            consumed: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// 签发新 state
    ///
    /// 令牌为固定长度的密码学随机字符串；与存活条目冲突时重新生成，
    /// 进程生命周期内不会出现两个同值的在用令牌。
    pub fn issue(&self, provider: &str, request_secret: Option<String>) -> String {
        let now = Utc::now();
        loop {
            let token = generate_state_token();
            let entry = LoginState {
                provider: provider.to_string(),
                issued_at: now,
                expires_at: now + self.ttl,
                request_secret: request_secret.clone(),
            };
            match self.store.entry(token.clone()) {
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(entry);
                    self.issued.fetch_add(1, Ordering::Relaxed);
                    return token;
                }
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
            }
        }
    }

    /// 消费 state，原子地查删
    ///
    /// 未知或已被消费的令牌报 `StateValidation`；过期条目同样报错，
    /// 且在本次调用中即被移除，之后重试也不会成功。
    pub fn consume(&self, token: &str) -> Result<LoginState> {
        match self.store.remove(token) {
            Some((_, state)) => {
                if state.is_expired(Utc::now()) {
                    self.expired.fetch_add(1, Ordering::Relaxed);
                    return Err(OAuthError::state_validation(
                        state.provider,
                        "state_expired",
                        "state已过期，请重新发起登录",
                    ));
                }
                self.consumed.fetch_add(1, Ordering::Relaxed);
                Ok(state)
            }
            None => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                Err(OAuthError::state_validation(
                    "unknown",
                    "invalid_state",
                    "state无效或已被使用",
                ))
            }
        }
    }

    /// 把签名请求族第一腿拿到的 request token secret 绑到已签发的 state 上
    pub fn bind_secret(&self, token: &str, secret: &str) -> Result<()> {
        match self.store.get_mut(token) {
            Some(mut entry) => {
                entry.request_secret = Some(secret.to_string());
                Ok(())
            }
            None => Err(OAuthError::state_validation(
                "unknown",
                "invalid_state",
                "state无效或已被使用",
            )),
        }
    }

    /// 丢弃未完成的 state（登录发起中途失败时回收），不计入消费统计
    pub fn discard(&self, token: &str) {
        self.store.remove(token);
    }

    /// 清理已过期条目，返回清理数量
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let stale: Vec<String> = self
            .store
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for token in stale {
            // remove_if 避免与并发 consume 重复计数
            if self
                .store
                .remove_if(&token, |_, state| state.is_expired(now))
                .is_some()
            {
                self.expired.fetch_add(1, Ordering::Relaxed);
                removed += 1;
            }
        }
        removed
    }

    /// 计数器快照
    pub fn stats(&self) -> StateStats {
        StateStats {
            issued: self.issued.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            pending: self.store.len(),
        }
    }

    /// 启动后台定期清理任务
    pub fn spawn_cleanup_task(
        self: &Arc<Self>,
        interval: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = manager.prune_expired();
                if removed > 0 {
                    tracing::debug!(removed, "清理过期 state");
                }
            }
        })
    }
}

fn generate_state_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_TOKEN_LEN)
        .map(char::from)
        .collect()
}
