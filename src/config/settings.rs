//! # 动态配置来源
//!
//! 运营方凭据（client_id / client_secret 等）存放在外部 JSON 配置缓存中，
//! 本服务只消费一个读操作：按名称取配置对象，取不到返回 `None`。
//! 通过 trait 抽象该协作方，便于在测试中注入内存实现。

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// 外部配置缓存的读取抽象
pub trait SettingsSource: Send + Sync {
    /// 按名称获取配置对象；不存在返回 `None`
    fn fetch(&self, name: &str) -> Option<Value>;
}

/// 基于 JSON 文件的配置来源
///
/// 文件顶层是 `名称 -> 对象` 的映射。`reload` 可在运维更新文件后刷新，
/// 读取端无需重启。
pub struct JsonFileSettings {
    path: PathBuf,
    cache: RwLock<Value>,
}

impl JsonFileSettings {
    /// 加载 JSON 文件；文件不存在视为空配置而非错误
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let cache = Self::read_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            cache: RwLock::new(cache),
        })
    }

    /// 重新读取配置文件
    pub fn reload(&self) -> anyhow::Result<()> {
        let fresh = Self::read_file(&self.path)?;
        let mut cache = self
            .cache
            .write()
            .map_err(|_| anyhow::anyhow!("配置缓存锁被污染"))?;
        *cache = fresh;
        Ok(())
    }

    fn read_file(path: &Path) -> anyhow::Result<Value> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "动态配置文件不存在，按空配置处理");
            return Ok(Value::Null);
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("读取动态配置 {} 失败: {}", path.display(), e))?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("解析动态配置 {} 失败: {}", path.display(), e))?;
        Ok(value)
    }
}

impl SettingsSource for JsonFileSettings {
    fn fetch(&self, name: &str) -> Option<Value> {
        let cache = self.cache.read().ok()?;
        cache.get(name).cloned()
    }
}

/// 内存配置来源，主要供测试使用
pub struct StaticSettings {
    root: Value,
}

impl StaticSettings {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// 全空的配置来源
    pub fn empty() -> Self {
        Self { root: Value::Null }
    }
}

impl SettingsSource for StaticSettings {
    fn fetch(&self, name: &str) -> Option<Value> {
        self.root.get(name).cloned()
    }
}
