//! # Config 模块
//!
//! 控制台宿主的配置管理。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

/// 控制台宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// 对话内容文件
    #[serde(default = "default_content_path")]
    pub content_path: PathBuf,

    /// 起始流 ID，覆盖内容文件中的 `start`
    #[serde(default)]
    pub start_stream: Option<String>,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 继续输入的防抖窗口（毫秒），0 表示关闭
    #[serde(default)]
    pub continue_debounce_ms: u64,

    /// 每次等待输入前打印序列器状态
    #[serde(default)]
    pub show_state: bool,
}

fn default_content_path() -> PathBuf {
    PathBuf::from("dialogue-cli/assets/demo.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            content_path: default_content_path(),
            start_stream: None,
            log_level: default_log_level(),
            continue_debounce_ms: 0,
            show_state: false,
        }
    }
}

impl CliConfig {
    /// 读取配置文件
    ///
    /// 调用方在失败时决定是否回退到默认配置。
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 解析日志级别
    pub fn max_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.log_level.trim())
            .map_err(|_| ConfigError::Validation(format!("无效的日志级别: {}", self.log_level)))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.max_level()?;

        if !self.content_path.exists() {
            return Err(ConfigError::Validation(format!(
                "内容文件不存在: {:?}",
                self.content_path
            )));
        }

        if let Some(start) = &self.start_stream
            && start.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "start_stream 不能为空字符串".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("配置文件不存在: {0:?}")]
    NotFound(PathBuf),

    /// IO 错误
    #[error("配置 IO 错误 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解析失败
    #[error("配置文件解析失败 {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    Serialize(#[source] serde_json::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    Validation(String),
}
