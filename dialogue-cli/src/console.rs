//! # Console 模块
//!
//! 终端上的表现层实现。
//!
//! - [`ConsolePresenter`]：把节点、选项写到任意 `Write`
//! - [`Recorder`]：在转发给内层表现层的同时记录指令，用于 `--transcript`

use std::io::Write;

use dialogue_runtime::{
    CommandBuffer, DialogueError, DialogueNode, DialogueResult, Layout, OptionSlot, Presenter,
};
use tracing::warn;

/// 终端表现层
pub struct ConsolePresenter<W: Write> {
    out: W,
    /// 对话界面是否可见
    visible: bool,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            visible: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) -> DialogueResult<()> {
        writeln!(self.out, "{}", line)
            .and_then(|_| self.out.flush())
            .map_err(|e| DialogueError::missing_collaborator(format!("终端输出 ({e})")))
    }

    /// 不可失败的入口（open/hide）只记录错误
    fn write_line_or_warn(&mut self, line: &str) {
        if let Err(e) = self.write_line(line) {
            warn!(error = %e, "终端输出失败");
        }
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn open(&mut self) {
        // 串联到后继流时界面已经可见
        if !self.visible {
            self.visible = true;
            self.write_line_or_warn("──────── 对话 ────────");
        }
    }

    fn show(&mut self, node: &DialogueNode) -> DialogueResult<()> {
        let mut line = String::new();
        if let Some(icon) = node.icon() {
            line.push_str(&format!("<{}> ", icon.as_str()));
        }
        if let Some(speaker) = node.speaker() {
            line.push_str(&format!("【{}】", speaker));
        }
        line.push_str(node.text().unwrap_or(""));
        self.write_line(&line)
    }

    fn render_options(&mut self, slots: &[OptionSlot], layout: Layout) -> DialogueResult<()> {
        match layout {
            Layout::Horizontal => {
                let row: Vec<String> = slots
                    .iter()
                    .map(|slot| format!("[{}] {}", slot.index + 1, slot.label))
                    .collect();
                self.write_line(&format!("  {}", row.join("   ")))
            }
            Layout::Vertical => Err(DialogueError::UnsupportedLayout { layout }),
        }
    }

    fn set_text(&mut self, text: &str) -> DialogueResult<()> {
        self.write_line(&format!("  ↳ {}", text))
    }

    fn hide(&mut self) {
        if self.visible {
            self.visible = false;
            self.write_line_or_warn("──────────────────────");
        }
    }
}

/// 记录型包装
///
/// 所有调用先记录到 [`CommandBuffer`]，再转发给内层表现层。
/// 内层返回的错误原样向上传递。
pub struct Recorder<P: Presenter> {
    inner: P,
    record: CommandBuffer,
}

impl<P: Presenter> Recorder<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            record: CommandBuffer::new(),
        }
    }

    pub fn record(&self) -> &CommandBuffer {
        &self.record
    }

    pub fn into_parts(self) -> (P, CommandBuffer) {
        (self.inner, self.record)
    }
}

impl<P: Presenter> Presenter for Recorder<P> {
    fn open(&mut self) {
        self.record.open();
        self.inner.open();
    }

    fn show(&mut self, node: &DialogueNode) -> DialogueResult<()> {
        self.record.show(node)?;
        self.inner.show(node)
    }

    fn render_options(&mut self, slots: &[OptionSlot], layout: Layout) -> DialogueResult<()> {
        self.record.render_options(slots, layout)?;
        self.inner.render_options(slots, layout)
    }

    fn clear_options(&mut self) {
        self.record.clear_options();
        self.inner.clear_options();
    }

    fn set_text(&mut self, text: &str) -> DialogueResult<()> {
        self.record.set_text(text)?;
        self.inner.set_text(text)
    }

    fn hide(&mut self) {
        self.record.hide();
        self.inner.hide();
    }
}
