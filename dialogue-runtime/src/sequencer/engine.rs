//! # Engine 模块
//!
//! 对话序列器状态机。
//!
//! ## 执行模型
//!
//! ```text
//! Idle ──play_stream──► Presenting(node)
//!                         │ advance / signal_continue / select_option
//!                         ├──► Presenting(next node)
//!                         ├──► Presenting(分支目标流的首节点)
//!                         ├──► Presenting(后继流的首节点)
//!                         └──► Idle (hide)
//! ```
//!
//! 呈现一个节点后序列器挂起，直到 Host 送来继续或选择信号，
//! 然后同步推进到下一个挂起点。回调只是普通闭包，拿不到序列器，
//! 因此串联过程中不会有信号插入。

use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::{DialogueError, DialogueResult, dangling_stream};
use crate::input::RuntimeInput;
use crate::node::{DialogueNode, Selection};
use crate::presenter::Presenter;
use crate::sequencer::present::Stage;
use crate::state::{SequencerState, WaitingReason};
use crate::stream::{DialogueGraph, StreamId};

/// 对话序列器
///
/// 每个会话一个实例：启动时创建，结束时 [`shutdown`](Self::shutdown)。
/// 调用方持有并注入它，不通过全局查找。
///
/// # 使用示例
///
/// ```ignore
/// let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
/// sequencer.play_stream(intro)?;
///
/// // Host 采集输入后
/// sequencer.handle_input(RuntimeInput::Continue)?;
/// ```
pub struct DialogueSequencer<P: Presenter> {
    /// 对话内容
    graph: Rc<DialogueGraph>,
    /// 表现层
    presenter: P,
    /// 运行时状态
    state: SequencerState,
    /// `play_single` 呈现的节点
    single: Option<DialogueNode>,
    /// 节点呈现器
    stage: Stage,
}

impl<P: Presenter> DialogueSequencer<P> {
    /// 创建序列器
    ///
    /// # 参数
    ///
    /// - `graph`: 对话内容（可与其他持有者共享）
    /// - `presenter`: 表现层
    pub fn new(graph: impl Into<Rc<DialogueGraph>>, presenter: P) -> Self {
        Self {
            graph: graph.into(),
            presenter,
            state: SequencerState::new(),
            single: None,
            stage: Stage::new(),
        }
    }

    /// 结束会话，返回表现层
    pub fn shutdown(mut self) -> P {
        self.stop_active_stream();
        self.presenter
    }

    /// 播放一个流
    ///
    /// 句柄不属于当前对话图时返回 `InvalidArgument`，状态不变。
    /// 正在播放时先打断当前播放（丢弃剩余节点和后继链，不触发回调）。
    pub fn play_stream(&mut self, stream: StreamId) -> DialogueResult<()> {
        if !self.graph.contains(stream) {
            let err = dangling_stream(stream);
            warn!(stream = %stream, error = %err, "无法播放对话流");
            return Err(err);
        }

        if !self.state.is_idle() {
            debug!(stream = %stream, interrupted = ?self.state.active_stream, "打断当前播放");
            self.stop_active_stream();
        }

        self.enter_stream(stream);
        Ok(())
    }

    /// 在任何流之外呈现单个节点
    ///
    /// 之后的 `advance()` 只会锁存继续信号（见 [`take_continue`](Self::take_continue)），
    /// 不触发完成回调，也不会串联或结束，由调用方决定后续。
    pub fn play_single(&mut self, node: DialogueNode) {
        if !self.state.is_idle() {
            debug!(interrupted = ?self.state.active_stream, "打断当前播放");
            self.stop_active_stream();
        }

        self.presenter.open();
        self.state.reset();
        let waiting = self.stage.present(&mut self.presenter, &node);
        self.state.wait(waiting);
        self.single = Some(node);
        debug!("呈现单个节点");
    }

    /// 继续信号（不受节点模式限制）
    ///
    /// 流中的节点：触发完成回调，然后呈现下一个节点或串联/结束。
    /// 单个节点：只锁存 `can_advance`。
    pub fn advance(&mut self) {
        if self.state.is_idle() {
            debug!("空闲时收到继续信号，忽略");
            return;
        }

        self.state.can_advance = true;

        if self.single.is_some() {
            debug!("单节点播放，锁存继续信号");
            return;
        }

        self.resume();
    }

    /// 通用的继续动作（受节点模式限制）
    ///
    /// 当前节点需要显式选择时忽略，返回 false。
    pub fn signal_continue(&mut self) -> bool {
        let accepts = self.current_node().map(DialogueNode::click_to_continue);
        match accepts {
            None => {
                debug!("空闲时收到继续输入，忽略");
                false
            }
            Some(false) => {
                debug!(
                    stream = ?self.state.active_stream,
                    index = self.state.current_node_index,
                    "当前节点需要显式选择，忽略继续输入"
                );
                false
            }
            Some(true) => {
                self.advance();
                true
            }
        }
    }

    /// 选择当前节点的某个选项
    ///
    /// 先按顺序调用选项回调；有目标流时放弃当前流（当前节点的完成回调不触发）
    /// 并播放目标流，否则等同于 `advance()`。
    pub fn select_option(&mut self, index: usize) -> DialogueResult<()> {
        let selection = {
            let Some(node) = self.current_node() else {
                let err = DialogueError::invalid_argument("没有正在呈现的节点");
                warn!(index, error = %err, "忽略选项选择");
                return Err(err);
            };

            let Some(option) = node.options().get(index) else {
                let err = DialogueError::invalid_argument(format!(
                    "选项索引 {} 越界，有效范围是 0..{}",
                    index,
                    node.options().len()
                ));
                warn!(index, error = %err, "忽略选项选择");
                return Err(err);
            };

            debug!(index, label = option.label(), "选中选项");
            option.select()
        };

        match selection {
            Selection::Branch(target) => {
                debug!(from = ?self.state.active_stream, to = %target, "分支跳转");
                self.play_stream(target)
            }
            Selection::Advance => {
                self.advance();
                Ok(())
            }
        }
    }

    /// 停止当前播放
    ///
    /// 幂等：空闲时什么都不做。不触发任何待执行的完成回调。
    pub fn stop_active_stream(&mut self) {
        if self.state.is_idle() {
            return;
        }
        debug!(stream = ?self.state.active_stream, "停止当前播放");
        self.terminate();
    }

    /// 取出锁存的继续信号
    ///
    /// 用于 `play_single` 之后轮询用户是否已继续。
    pub fn take_continue(&mut self) -> bool {
        std::mem::replace(&mut self.state.can_advance, false)
    }

    /// 替换当前显示的正文，不改变其他状态
    pub fn set_text(&mut self, text: &str) {
        if self.state.is_idle() {
            debug!("空闲时忽略正文替换");
            return;
        }
        if let Err(e) = self.presenter.set_text(text) {
            warn!(error = %e, "正文替换失败");
        }
    }

    /// 处理 Host 输入
    pub fn handle_input(&mut self, input: RuntimeInput) -> DialogueResult<()> {
        match input {
            RuntimeInput::Continue => {
                self.signal_continue();
                Ok(())
            }
            RuntimeInput::ChoiceSelected { index } => self.select_option(index),
        }
    }

    /// 当前正在呈现的节点
    pub fn current_node(&self) -> Option<&DialogueNode> {
        if self.state.is_idle() {
            return None;
        }
        if let Some(node) = &self.single {
            return Some(node);
        }
        let stream = self.graph.get(self.state.active_stream?)?;
        stream.node(self.state.current_node_index)
    }

    /// 获取当前状态
    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    /// 获取当前等待状态
    pub fn waiting(&self) -> &WaitingReason {
        &self.state.waiting
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn active_stream(&self) -> Option<StreamId> {
        self.state.active_stream
    }

    pub fn graph(&self) -> &DialogueGraph {
        &self.graph
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// 消费继续信号，推进到下一个挂起点
    fn resume(&mut self) {
        let Some(stream_id) = self.state.active_stream else {
            return;
        };
        if !self.state.can_advance {
            return;
        }
        self.state.can_advance = false;

        let graph = Rc::clone(&self.graph);
        let Some(stream) = graph.get(stream_id) else {
            warn!(stream = %stream_id, "当前流已不存在，结束对话");
            self.terminate();
            return;
        };

        let index = self.state.current_node_index;
        if let Some(node) = stream.node(index) {
            node.on_complete().invoke_all();
        }

        let next_index = index + 1;
        match stream.node(next_index) {
            Some(node) => {
                self.state.current_node_index = next_index;
                self.present(node);
            }
            None => self.chain_or_terminate(stream.next()),
        }
    }

    /// 流结束后：播放后继流，或回到空闲
    fn chain_or_terminate(&mut self, next: Option<StreamId>) {
        match next {
            Some(next) => {
                debug!(from = ?self.state.active_stream, to = %next, "串联后继流");
                self.enter_stream(next);
            }
            None => {
                debug!(stream = ?self.state.active_stream, "对话流播放完毕");
                self.terminate();
            }
        }
    }

    /// 进入一个流并呈现首节点
    ///
    /// 空流立即串联或结束。只由空流构成的环永远到不了挂起点，
    /// 跳转次数超过流的总数后结束对话。
    fn enter_stream(&mut self, first: StreamId) {
        let graph = Rc::clone(&self.graph);
        let mut current = first;
        let mut empty_hops = 0usize;

        loop {
            let Some(stream) = graph.get(current) else {
                warn!(stream = %current, "后继流不存在，结束对话");
                self.terminate();
                return;
            };

            self.single = None;
            self.presenter.open();
            self.state.enter(current);
            debug!(stream = %current, name = stream.name(), nodes = stream.len(), "开始播放对话流");

            if let Some(node) = stream.node(0) {
                self.present(node);
                return;
            }

            empty_hops += 1;
            match stream.next() {
                Some(next) if empty_hops <= graph.len() => current = next,
                Some(_) => {
                    warn!(stream = %current, "空流构成环，没有可呈现的节点，结束对话");
                    self.terminate();
                    return;
                }
                None => {
                    self.terminate();
                    return;
                }
            }
        }
    }

    fn present(&mut self, node: &DialogueNode) {
        self.state.can_advance = false;
        let waiting = self.stage.present(&mut self.presenter, node);
        self.state.wait(waiting);
    }

    fn terminate(&mut self) {
        self.state.reset();
        self.single = None;
        self.stage.dismiss(&mut self.presenter);
        self.presenter.hide();
    }
}
