//! # 应用配置
//!
//! 服务级静态配置：监听地址、回调基地址、state TTL、上游超时等。
//! 从 TOML 文件加载，命令行参数可覆盖监听端口与配置路径。

pub mod settings;

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use settings::{JsonFileSettings, SettingsSource, StaticSettings};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "third-login", about = "第三方登录联合认证服务")]
pub struct CliArgs {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// 覆盖监听端口
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 回调基地址，如 `https://example.com`，
    /// 提供商回调统一拼为 `{redirect_base}/oauth/callback/{provider}`
    pub redirect_base: String,
    /// 动态凭据（外部 JSON 配置缓存）文件路径
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
    /// state 有效期（秒）
    #[serde(default = "default_state_ttl")]
    pub state_ttl_secs: u64,
    /// 上游请求超时（秒）
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8320
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.json")
}

const fn default_state_ttl() -> u64 {
    300
}

const fn default_http_timeout() -> u64 {
    10
}

impl AppConfig {
    /// 从 TOML 文件加载配置，随后套用环境变量覆盖
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("读取配置文件 {} 失败: {}", path.display(), e))?;
        let mut config: Self = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("解析配置文件 {} 失败: {}", path.display(), e))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 环境变量覆盖：`THIRD_LOGIN_HOST` / `THIRD_LOGIN_PORT` / `THIRD_LOGIN_REDIRECT_BASE`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("THIRD_LOGIN_HOST") {
            if !host.is_empty() {
                self.host = host;
            }
        }
        if let Ok(port) = std::env::var("THIRD_LOGIN_PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
        if let Ok(base) = std::env::var("THIRD_LOGIN_REDIRECT_BASE") {
            if !base.is_empty() {
                self.redirect_base = base;
            }
        }
    }

    /// 监听地址
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 指定提供商的回调地址
    pub fn callback_uri(&self, provider: &str) -> String {
        format!(
            "{}/oauth/callback/{}",
            self.redirect_base.trim_end_matches('/'),
            provider
        )
    }

    /// state 有效期
    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state_ttl_secs)
    }

    /// 上游请求超时
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            redirect_base: format!("http://127.0.0.1:{}", default_port()),
            settings_path: default_settings_path(),
            state_ttl_secs: default_state_ttl(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}
