//! # Presenter 模块
//!
//! 序列器与表现层之间的契约。
//!
//! 表现层（文本/头像渲染、按钮实例化、界面显隐）由 Host 实现，
//! 序列器只在状态转换成功后调用这些方法。可失败的方法返回
//! `DialogueResult`，序列器记录错误并只跳过受影响的元素。

use crate::command::Command;
use crate::error::{DialogueError, DialogueResult};
use crate::layout::OptionSlot;
use crate::node::{DialogueNode, Layout};

/// 表现层协作者
pub trait Presenter {
    /// 显示对话界面
    fn open(&mut self) {}

    /// 渲染节点的说话者、正文、头像
    fn show(&mut self, node: &DialogueNode) -> DialogueResult<()>;

    /// 渲染选项按钮，每个按钮回传 `ChoiceSelected { index }`
    fn render_options(&mut self, slots: &[OptionSlot], layout: Layout) -> DialogueResult<()>;

    /// 销毁上一个节点的选项按钮
    fn clear_options(&mut self) {}

    /// 只替换当前正文，不影响其他状态
    fn set_text(&mut self, text: &str) -> DialogueResult<()>;

    /// 隐藏对话界面
    fn hide(&mut self);
}

/// 记录型表现层
///
/// 把每次调用记录为 [`Command`]，不做任何渲染。
#[derive(Debug)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    /// 是否配置了选项按钮容器
    option_bounds: bool,
}

impl CommandBuffer {
    /// 创建记录器
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            option_bounds: true,
        }
    }

    /// 创建没有选项按钮容器的记录器
    ///
    /// `render_options` 会返回 `MissingCollaborator`。
    pub fn without_option_bounds() -> Self {
        Self {
            commands: Vec::new(),
            option_bounds: false,
        }
    }

    /// 获取全部已记录的指令
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// 取出并清空已记录的指令
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// `hide` 被调用的次数
    pub fn hide_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Hide))
            .count()
    }

    /// 按顺序列出所有显示过的正文
    pub fn shown_texts(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::ShowNode { text, .. } => Some(text.clone().unwrap_or_default()),
                _ => None,
            })
            .collect()
    }

    /// 最近一次显示的正文
    pub fn last_shown_text(&self) -> Option<String> {
        self.shown_texts().pop()
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for CommandBuffer {
    fn open(&mut self) {
        self.commands.push(Command::Open);
    }

    fn show(&mut self, node: &DialogueNode) -> DialogueResult<()> {
        self.commands.push(Command::show_node(node));
        Ok(())
    }

    fn render_options(&mut self, slots: &[OptionSlot], layout: Layout) -> DialogueResult<()> {
        if !self.option_bounds {
            return Err(DialogueError::missing_collaborator("选项按钮容器"));
        }
        self.commands.push(Command::RenderOptions {
            layout,
            slots: slots.to_vec(),
        });
        Ok(())
    }

    fn clear_options(&mut self) {
        self.commands.push(Command::ClearOptions);
    }

    fn set_text(&mut self, text: &str) -> DialogueResult<()> {
        self.commands.push(Command::SetText {
            text: text.to_string(),
        });
        Ok(())
    }

    fn hide(&mut self) {
        self.commands.push(Command::Hide);
    }
}
