//! # Error 模块
//!
//! 定义 dialogue-runtime 中使用的错误类型。
//!
//! 运行时错误全部在引擎内部就地恢复（记录日志、跳过受影响的效果），
//! 调用方通过返回值观察被拒绝的操作，但序列器始终保持一致状态。

use thiserror::Error;

use crate::node::Layout;
use crate::stream::StreamId;

/// 运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialogueError {
    /// 无效参数（不存在的流、越界的选项等）
    #[error("无效参数: {message}")]
    InvalidArgument { message: String },

    /// 该布局没有对应的渲染实现
    #[error("布局 {layout:?} 尚未实现，选项按钮不会被布局")]
    UnsupportedLayout { layout: Layout },

    /// 表现层缺少协作者（例如未配置选项按钮容器）
    #[error("缺少协作者: {collaborator}")]
    MissingCollaborator { collaborator: String },
}

impl DialogueError {
    /// 创建无效参数错误
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// 创建缺少协作者错误
    pub fn missing_collaborator(collaborator: impl Into<String>) -> Self {
        Self::MissingCollaborator {
            collaborator: collaborator.into(),
        }
    }
}

/// 内容资源错误
///
/// 在把 JSON 内容构建为 [`DialogueGraph`](crate::DialogueGraph) 时产生。
#[derive(Error, Debug)]
pub enum ContentError {
    /// JSON 语法或结构错误
    #[error("内容解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 重复的流 ID
    #[error("重复的流 ID '{id}'")]
    DuplicateStream { id: String },

    /// 引用了不存在的流
    #[error("{referenced_by} 引用了不存在的流 '{id}'")]
    UnknownStream { id: String, referenced_by: String },
}

/// 悬空的流句柄（来自其他图，或图已被替换）
pub(crate) fn dangling_stream(id: StreamId) -> DialogueError {
    DialogueError::invalid_argument(format!("流 {id} 不存在于当前对话图中"))
}

/// Result 类型别名
pub type DialogueResult<T> = Result<T, DialogueError>;
