//! # Present 模块
//!
//! 把单个节点转换为表现层调用。
//!
//! ## 职责
//!
//! - 销毁上一个节点的选项按钮
//! - 显示节点、规划并渲染选项按钮
//! - 决定呈现后的等待原因
//!
//! 表现层返回的错误在这里记录并吞掉，只影响对应的元素。

use tracing::warn;

use crate::layout::plan_option_slots;
use crate::node::DialogueNode;
use crate::presenter::Presenter;
use crate::state::WaitingReason;

/// 节点呈现器
#[derive(Debug, Default)]
pub(crate) struct Stage {
    /// 上一个节点是否留下了选项按钮
    options_rendered: bool,
}

impl Stage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 销毁残留的选项按钮
    ///
    /// 在隐藏对话界面之前调用，回到空闲后不再留有按钮状态。
    pub(crate) fn dismiss<P: Presenter>(&mut self, presenter: &mut P) {
        if self.options_rendered {
            presenter.clear_options();
            self.options_rendered = false;
        }
    }

    /// 呈现节点，返回呈现后的等待原因
    pub(crate) fn present<P: Presenter>(
        &mut self,
        presenter: &mut P,
        node: &DialogueNode,
    ) -> WaitingReason {
        self.dismiss(presenter);

        if let Err(e) = presenter.show(node) {
            warn!(error = %e, "节点显示失败");
        }

        if node.has_options() {
            let layout = node.layout();
            match plan_option_slots(node.options(), layout) {
                Ok(slots) => match presenter.render_options(&slots, layout) {
                    Ok(()) => self.options_rendered = true,
                    Err(e) => warn!(error = %e, "选项按钮渲染失败"),
                },
                Err(e) => warn!(error = %e, layout = ?layout, "选项按钮未布局"),
            }
        }

        WaitingReason::for_node(node)
    }
}
