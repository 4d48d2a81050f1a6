//! # Input 模块
//!
//! 定义 Host 向序列器传递的输入事件。
//!
//! ## 设计说明
//!
//! - `RuntimeInput` 是 Host 采集用户操作后，传递给序列器的抽象输入
//! - 序列器不直接处理鼠标/键盘事件，只处理语义化的输入
//! - 防抖由 Host 在边界完成

use serde::{Deserialize, Serialize};

/// Host 向序列器传递的输入
///
/// 序列器通过 `handle_input(input)` 接收这些输入。
///
/// - `Continue`：通用的继续动作，只对点击继续的节点生效
/// - `ChoiceSelected`：选择了当前节点的某个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeInput {
    /// 继续（解除 `WaitForClick`）
    Continue,

    /// 用户选择了某个选项（解除 `WaitForChoice`）
    ///
    /// `index` 是选项的索引（从 0 开始）
    ChoiceSelected { index: usize },
}

impl RuntimeInput {
    /// 创建继续输入
    pub fn continue_() -> Self {
        Self::Continue
    }

    /// 创建选择输入
    pub fn choice(index: usize) -> Self {
        Self::ChoiceSelected { index }
    }
}
