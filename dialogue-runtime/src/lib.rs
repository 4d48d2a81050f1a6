//! # Dialogue Runtime
//!
//! 分支对话序列器的核心运行时库。
//!
//! ## 架构概述
//!
//! `dialogue-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 它通过 **表现层契约** 与宿主层（Host）通信：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── RuntimeInput ────────────────►│ handle_input()
//!   │                                   │
//!   │◄─── Presenter::open/show/hide ────│
//!   │                                   │
//!   │──── waiting() ───────────────────►│ WaitingReason
//! ```
//!
//! ## 核心类型
//!
//! - [`DialogueNode`] / [`DialogueOption`]：一次对话交换与玩家选项
//! - [`DialogueStream`] / [`DialogueGraph`]：有序节点序列与流的集合（可成环）
//! - [`DialogueSequencer`]：逐节点播放的状态机
//! - [`Presenter`]：由 Host 实现的表现层
//! - [`WaitingReason`]：序列器的等待状态
//!
//! ## 使用示例
//!
//! ```ignore
//! use dialogue_runtime::{ContentAsset, DialogueSequencer, RuntimeInput};
//!
//! let content = ContentAsset::from_json(text)?.build()?;
//! let mut sequencer = DialogueSequencer::new(content.graph, presenter);
//! sequencer.play_stream(start)?;
//!
//! // 主循环
//! while !sequencer.is_idle() {
//!     let input = match sequencer.waiting() {
//!         WaitingReason::WaitForClick => wait_for_click(),
//!         WaitingReason::WaitForChoice { .. } => wait_for_choice(),
//!         WaitingReason::None => break,
//!     };
//!     sequencer.handle_input(input)?;
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`node`]：节点、选项、回调
//! - [`stream`]：流与对话图
//! - [`sequencer`]：序列器状态机
//! - [`presenter`]：表现层契约与记录型实现
//! - [`layout`]：选项按钮布局规划
//! - [`command`]：表现层调用的记录形式
//! - [`content`]：JSON 内容资源
//! - [`diagnostic`]：对话图静态检查
//! - [`input`] / [`state`] / [`error`]

pub mod command;
pub mod content;
pub mod diagnostic;
pub mod error;
pub mod input;
pub mod layout;
pub mod node;
pub mod presenter;
pub mod sequencer;
pub mod state;
pub mod stream;

// 重导出核心类型
pub use command::{Command, transcript};
pub use content::{Content, ContentAsset, NodeAsset, OptionAsset, StreamAsset};
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_graph};
pub use error::{ContentError, DialogueError, DialogueResult};
pub use input::RuntimeInput;
pub use layout::{OptionSlot, plan_option_slots};
pub use node::{Callback, Callbacks, DialogueNode, DialogueOption, IconRef, Layout, Selection};
pub use presenter::{CommandBuffer, Presenter};
pub use sequencer::DialogueSequencer;
pub use state::{SequencerState, WaitingReason};
pub use stream::{DialogueGraph, DialogueStream, StreamId};
