//! # Session 模块
//!
//! 逐行读取输入驱动序列器，直到对话结束、玩家退出或输入关闭。

use std::io::{BufRead, Write};
use std::time::Instant;

use dialogue_runtime::{DialogueSequencer, Presenter};
use tracing::{debug, warn};

use crate::input::{InputAction, InputManager};

const HELP: &str = "\
命令:
  <回车> / c   继续
  <数字>       选择对应选项
  state        打印序列器状态
  help         显示本帮助
  q / quit     结束对话";

/// 会话结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// 对话自然结束（序列器回到空闲）
    Finished,
    /// 玩家主动退出
    Quit,
    /// 输入流关闭
    InputClosed,
}

/// 一次控制台对话会话
pub struct Session<P: Presenter> {
    sequencer: DialogueSequencer<P>,
    input: InputManager,
    show_state: bool,
}

impl<P: Presenter> Session<P> {
    pub fn new(sequencer: DialogueSequencer<P>, input: InputManager, show_state: bool) -> Self {
        Self {
            sequencer,
            input,
            show_state,
        }
    }

    pub fn sequencer(&self) -> &DialogueSequencer<P> {
        &self.sequencer
    }

    /// 运行主循环
    ///
    /// `out` 只用于提示、帮助和状态输出，对话内容由表现层负责。
    pub fn run(&mut self, mut reader: impl BufRead, out: &mut impl Write) -> anyhow::Result<SessionEnd> {
        let mut line = String::new();

        loop {
            if self.sequencer.is_idle() {
                return Ok(SessionEnd::Finished);
            }

            if self.show_state {
                self.write_state(out)?;
            }

            line.clear();
            if reader.read_line(&mut line)? == 0 {
                debug!("输入流关闭");
                self.sequencer.stop_active_stream();
                return Ok(SessionEnd::InputClosed);
            }

            let action = self
                .input
                .interpret(&line, self.sequencer.waiting(), Instant::now());

            match action {
                None => {}
                Some(InputAction::Runtime(input)) => {
                    if let Err(e) = self.sequencer.handle_input(input) {
                        warn!(error = %e, "输入被序列器拒绝");
                        writeln!(out, "{}", e)?;
                    }
                }
                Some(InputAction::ShowState) => self.write_state(out)?,
                Some(InputAction::Help) => writeln!(out, "{}", HELP)?,
                Some(InputAction::Rejected(hint)) => writeln!(out, "{}", hint)?,
                Some(InputAction::Quit) => {
                    self.sequencer.stop_active_stream();
                    return Ok(SessionEnd::Quit);
                }
            }
        }
    }

    fn write_state(&self, out: &mut impl Write) -> anyhow::Result<()> {
        let state = serde_json::to_string(self.sequencer.state())?;
        writeln!(out, "state: {}", state)?;
        Ok(())
    }

    /// 结束会话，返回表现层
    pub fn shutdown(self) -> P {
        self.sequencer.shutdown()
    }
}
