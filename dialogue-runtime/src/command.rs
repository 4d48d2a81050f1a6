//! # Command 模块
//!
//! 定义序列器对表现层发出的指令的记录形式。
//!
//! ## 设计原则
//!
//! - **声明式**：Command 描述"做什么"，不描述"怎么做"
//! - **无副作用**：Command 本身不执行任何操作
//! - **引擎无关**：不包含任何渲染引擎的类型
//!
//! [`CommandBuffer`](crate::presenter::CommandBuffer) 把每次
//! [`Presenter`](crate::presenter::Presenter) 调用记录为一条 Command，
//! 测试和 CLI 的 transcript 输出都基于它。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout::OptionSlot;
use crate::node::{DialogueNode, IconRef, Layout};

/// 表现层指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// 显示对话界面
    Open,

    /// 显示一个节点
    ShowNode {
        /// 说话者
        speaker: Option<String>,
        /// 正文
        text: Option<String>,
        /// 头像
        icon: Option<IconRef>,
        /// 选项布局
        layout: Layout,
        /// 选项文本
        options: Vec<String>,
    },

    /// 渲染选项按钮
    RenderOptions {
        layout: Layout,
        slots: Vec<OptionSlot>,
    },

    /// 销毁上一个节点的选项按钮
    ClearOptions,

    /// 替换当前正文
    SetText { text: String },

    /// 隐藏对话界面
    Hide,
}

impl Command {
    /// 从节点创建 ShowNode 指令
    pub fn show_node(node: &DialogueNode) -> Self {
        Self::ShowNode {
            speaker: node.speaker().map(str::to_string),
            text: node.text().map(str::to_string),
            icon: node.icon().cloned(),
            layout: node.layout(),
            options: node
                .options()
                .iter()
                .map(|o| o.label().to_string())
                .collect(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Open => write!(f, "open"),
            Command::ShowNode {
                speaker,
                text,
                options,
                ..
            } => {
                write!(f, "show")?;
                if let Some(speaker) = speaker {
                    write!(f, " [{}]", speaker)?;
                }
                write!(f, " {}", text.as_deref().unwrap_or(""))?;
                if !options.is_empty() {
                    write!(f, " ({})", options.join(" | "))?;
                }
                Ok(())
            }
            Command::RenderOptions { layout, slots } => {
                write!(f, "options {:?}:", layout)?;
                for slot in slots {
                    write!(
                        f,
                        " {}[{:.2}-{:.2}]",
                        slot.label, slot.anchor_min, slot.anchor_max
                    )?;
                }
                Ok(())
            }
            Command::ClearOptions => write!(f, "clear-options"),
            Command::SetText { text } => write!(f, "set-text {}", text),
            Command::Hide => write!(f, "hide"),
        }
    }
}

/// 把一组指令渲染为逐行文本
pub fn transcript(commands: &[Command]) -> String {
    commands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
