//! # Sequencer 模块
//!
//! 对话序列器核心，负责播放、推进、分支、串联和停止。
//!
//! ## 模块结构
//!
//! - [`engine`]：状态机
//! - `present`：把节点交给表现层，并决定等待原因

pub mod engine;
mod present;

pub use engine::DialogueSequencer;
