//! # Dialogue CLI
//!
//! 控制台宿主：从磁盘加载配置与内容，用终端实现表现层，
//! 逐行读取 stdin 驱动 `dialogue-runtime` 的序列器。

pub mod config;
pub mod console;
pub mod input;
pub mod session;

use std::rc::Rc;

use dialogue_runtime::{Callback, Content, ContentAsset, StreamId};
use tracing::info;

pub use config::{CliConfig, ConfigError};
pub use console::{ConsolePresenter, Recorder};
pub use input::{InputAction, InputManager};
pub use session::{Session, SessionEnd};

/// 解析内容文本并构建对话图
///
/// 内容里的事件在终端宿主里没有游戏逻辑可以驱动，绑定为日志输出。
pub fn load_content(text: &str) -> anyhow::Result<Content> {
    let content = ContentAsset::from_json(text)?.build_with(|event| {
        let event = event.to_string();
        let callback: Callback = Rc::new(move || info!(event = %event, "触发内容事件"));
        Some(callback)
    })?;
    Ok(content)
}

/// 决定起始流：配置中的 `start_stream` 优先于内容里的 `start`
pub fn resolve_start(content: &Content, start_stream: Option<&str>) -> anyhow::Result<Option<StreamId>> {
    match start_stream {
        Some(name) => content
            .graph
            .find(name)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("起始流 '{}' 不存在", name)),
        None => Ok(content.start),
    }
}
