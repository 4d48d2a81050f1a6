//! # Layout 模块
//!
//! 把节点的选项规划为按钮槽位，交给表现层渲染。
//!
//! 水平布局把选项按钮等分拉伸到容器宽度：第 `i` 个（共 `n` 个）
//! 占据锚点区间 `[i/n, (i+1)/n]`。

use serde::{Deserialize, Serialize};

use crate::error::{DialogueError, DialogueResult};
use crate::node::{DialogueOption, Layout};

/// 一个选项按钮的槽位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSlot {
    /// 选项索引（用于回传 `ChoiceSelected`）
    pub index: usize,
    /// 按钮文本
    pub label: String,
    /// 布局方向上的起始锚点（0.0 - 1.0）
    pub anchor_min: f32,
    /// 布局方向上的结束锚点（0.0 - 1.0）
    pub anchor_max: f32,
    /// 选中后是否跳转到其他流
    pub branches: bool,
}

/// 规划选项槽位
///
/// 没有渲染实现的布局返回 `UnsupportedLayout`。
pub fn plan_option_slots(
    options: &[DialogueOption],
    layout: Layout,
) -> DialogueResult<Vec<OptionSlot>> {
    match layout {
        Layout::Horizontal => Ok(horizontal_slots(options)),
        Layout::Vertical => Err(DialogueError::UnsupportedLayout { layout }),
    }
}

fn horizontal_slots(options: &[DialogueOption]) -> Vec<OptionSlot> {
    let count = options.len() as f32;
    options
        .iter()
        .enumerate()
        .map(|(i, option)| OptionSlot {
            index: i,
            label: option.label().to_string(),
            anchor_min: i as f32 / count,
            anchor_max: (i + 1) as f32 / count,
            branches: option.target().is_some(),
        })
        .collect()
}
