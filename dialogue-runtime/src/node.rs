//! # Node 模块
//!
//! 对话节点与对话选项的数据模型。
//!
//! ## 设计说明
//!
//! - `DialogueNode` 是一次显示的单位：说话者、正文、头像、选项布局、选项列表
//! - `DialogueOption` 通过 [`StreamId`] 引用目标流，而不是持有它
//! - 回调以 `Rc<dyn Fn()>` 存储，按注册顺序同步调用

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::stream::StreamId;

/// 副作用回调
pub type Callback = Rc<dyn Fn()>;

/// 有序回调列表
///
/// 克隆时共享同一组回调。
#[derive(Clone, Default)]
pub struct Callbacks {
    handlers: Vec<Callback>,
}

impl Callbacks {
    /// 创建空列表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册回调
    pub fn push(&mut self, handler: impl Fn() + 'static) {
        self.handlers.push(Rc::new(handler));
    }

    /// 注册已包装好的回调
    pub fn push_shared(&mut self, handler: Callback) {
        self.handlers.push(handler);
    }

    /// 按注册顺序依次调用
    pub fn invoke_all(&self) {
        for handler in &self.handlers {
            handler();
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callbacks({})", self.handlers.len())
    }
}

/// 选项按钮布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// 水平排列（默认）
    #[default]
    Horizontal,
    /// 垂直排列
    Vertical,
}

/// 头像引用
///
/// 对引擎来说是不透明的句柄，由表现层解释（通常是资源路径）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconRef(String);

impl IconRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 选项被选中后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 放弃当前流剩余节点，跳转到目标流
    Branch(StreamId),
    /// 当前节点正常推进
    Advance,
}

/// 对话选项
#[derive(Debug, Clone)]
pub struct DialogueOption {
    label: String,
    target: Option<StreamId>,
    on_select: Callbacks,
}

impl DialogueOption {
    /// 创建选项
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: None,
            on_select: Callbacks::new(),
        }
    }

    /// 设置目标流
    pub fn with_target(mut self, target: StreamId) -> Self {
        self.target = Some(target);
        self
    }

    /// 附加一个选中回调
    pub fn with_action(mut self, action: impl Fn() + 'static) -> Self {
        self.on_select.push(action);
        self
    }

    /// 附加一个选中回调
    pub fn add_action(&mut self, action: impl Fn() + 'static) {
        self.on_select.push(action);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> Option<StreamId> {
        self.target
    }

    pub fn on_select(&self) -> &Callbacks {
        &self.on_select
    }

    pub(crate) fn on_select_mut(&mut self) -> &mut Callbacks {
        &mut self.on_select
    }

    /// 选中该选项
    ///
    /// 先按顺序调用所有选中回调，再告知序列器应当跳转还是推进。
    pub fn select(&self) -> Selection {
        self.on_select.invoke_all();
        match self.target {
            Some(target) => Selection::Branch(target),
            None => Selection::Advance,
        }
    }
}

/// 对话节点
///
/// 不变量：只要 `options` 非空，`requires_explicit_choice` 就为 true。
#[derive(Debug, Clone, Default)]
pub struct DialogueNode {
    speaker: Option<String>,
    text: Option<String>,
    icon: Option<IconRef>,
    layout: Layout,
    options: Vec<DialogueOption>,
    on_complete: Callbacks,
    requires_explicit_choice: bool,
}

impl DialogueNode {
    /// 创建空节点（无文本、无选项，点击继续）
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建只有正文的节点
    pub fn line(text: impl Into<String>) -> Self {
        Self::new().with_text(text)
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_icon(mut self, icon: IconRef) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// 添加选项（节点随即需要显式选择）
    pub fn with_option(mut self, option: DialogueOption) -> Self {
        self.push_option(option);
        self
    }

    /// 附加一个完成回调
    pub fn with_on_complete(mut self, action: impl Fn() + 'static) -> Self {
        self.on_complete.push(action);
        self
    }

    /// 即使没有选项也不接受普通的继续输入
    pub fn requiring_choice(mut self) -> Self {
        self.requires_explicit_choice = true;
        self
    }

    /// 添加选项
    pub fn push_option(&mut self, option: DialogueOption) {
        self.options.push(option);
        self.requires_explicit_choice = true;
    }

    /// 附加一个完成回调
    pub fn add_on_complete(&mut self, action: impl Fn() + 'static) {
        self.on_complete.push(action);
    }

    /// 一次性替换节点内容
    pub fn set_all(
        &mut self,
        speaker: Option<String>,
        text: Option<String>,
        icon: Option<IconRef>,
        options: Vec<DialogueOption>,
    ) {
        self.speaker = speaker;
        self.text = text;
        self.icon = icon;
        self.options = options;
        if !self.options.is_empty() {
            self.requires_explicit_choice = true;
        }
    }

    /// 设置是否需要显式选择
    ///
    /// 有选项的节点无法改回点击继续。
    pub fn set_requires_explicit_choice(&mut self, value: bool) {
        self.requires_explicit_choice = value || !self.options.is_empty();
    }

    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn icon(&self) -> Option<&IconRef> {
        self.icon.as_ref()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn options(&self) -> &[DialogueOption] {
        &self.options
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn on_complete(&self) -> &Callbacks {
        &self.on_complete
    }

    pub(crate) fn on_complete_mut(&mut self) -> &mut Callbacks {
        &mut self.on_complete
    }

    pub fn requires_explicit_choice(&self) -> bool {
        self.requires_explicit_choice
    }

    /// 是否接受普通的继续输入
    pub fn click_to_continue(&self) -> bool {
        !self.requires_explicit_choice
    }
}
