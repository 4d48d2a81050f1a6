//! # State 模块
//!
//! 定义序列器的运行时状态和等待模型。
//!
//! ## 设计原则
//!
//! - 所有状态必须**显式建模**
//! - 状态只由序列器自己的方法修改
//! - 不允许隐式全局状态

use serde::{Deserialize, Serialize};

use crate::node::DialogueNode;
use crate::stream::StreamId;

/// 等待原因
///
/// 序列器呈现一个节点后挂起，需要特定输入才能继续。
/// Host 根据此状态决定如何采集输入。
///
/// # 状态转换
///
/// ```text
/// None          -> 空闲，没有正在呈现的节点
/// WaitForClick  -> 等待继续输入（点击继续）
/// WaitForChoice -> 等待选项选择，普通的继续输入会被忽略
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaitingReason {
    /// 不等待（空闲）
    #[default]
    None,

    /// 等待继续输入
    WaitForClick,

    /// 等待选项选择
    ///
    /// `choice_count` 记录选项数量，用于验证输入合法性。
    /// 需要显式选择但没有选项的节点为 0。
    WaitForChoice { choice_count: usize },
}

impl WaitingReason {
    /// 是否处于等待状态
    pub fn is_waiting(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// 创建等待点击状态
    pub fn click() -> Self {
        Self::WaitForClick
    }

    /// 创建等待选择状态
    pub fn choice(count: usize) -> Self {
        Self::WaitForChoice {
            choice_count: count,
        }
    }

    /// 呈现某个节点后应当进入的等待状态
    pub fn for_node(node: &DialogueNode) -> Self {
        if node.requires_explicit_choice() {
            Self::choice(node.options().len())
        } else {
            Self::click()
        }
    }
}

/// 序列器状态
///
/// 所有字段都可序列化，便于 Host 调试输出（不用于存档）。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequencerState {
    /// 当前播放的流（单节点播放时为 None）
    pub active_stream: Option<StreamId>,

    /// 当前节点在流中的索引
    pub current_node_index: usize,

    /// 是否已收到继续信号
    pub can_advance: bool,

    /// 当前等待状态
    pub waiting: WaitingReason,
}

impl SequencerState {
    /// 创建空闲状态
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否空闲
    pub fn is_idle(&self) -> bool {
        !self.waiting.is_waiting()
    }

    /// 进入某个流的开头
    pub fn enter(&mut self, stream: StreamId) {
        self.active_stream = Some(stream);
        self.current_node_index = 0;
        self.can_advance = false;
    }

    /// 进入等待状态
    pub fn wait(&mut self, reason: WaitingReason) {
        self.waiting = reason;
    }

    /// 回到空闲状态
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
