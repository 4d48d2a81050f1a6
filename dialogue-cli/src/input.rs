//! # Input 模块
//!
//! 把终端输入的一行文本转换为 RuntimeInput。
//!
//! ## 设计说明
//!
//! - 根据当前 `WaitingReason` 决定如何解释输入
//! - 等待选择时普通的继续输入不会送达序列器
//! - 继续输入带防抖，窗口内的重复输入被丢弃
//! - 选项编号对玩家从 1 开始，对序列器从 0 开始

use std::time::{Duration, Instant};

use dialogue_runtime::{RuntimeInput, WaitingReason};
use tracing::debug;

/// 一行输入对应的动作
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    /// 送达序列器
    Runtime(RuntimeInput),
    /// 打印序列器状态
    ShowState,
    /// 打印帮助
    Help,
    /// 结束会话
    Quit,
    /// 当前状态下无效，附带提示
    Rejected(String),
}

/// 输入管理器
#[derive(Debug)]
pub struct InputManager {
    /// 继续输入的防抖窗口
    debounce: Duration,
    /// 上次被接受的继续输入时间
    last_continue: Option<Instant>,
}

impl InputManager {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_continue: None,
        }
    }

    /// 解释一行输入
    ///
    /// 返回 None 表示输入被忽略（空闲或被防抖丢弃）。
    pub fn interpret(
        &mut self,
        line: &str,
        waiting: &WaitingReason,
        now: Instant,
    ) -> Option<InputAction> {
        let line = line.trim();

        match line {
            "q" | "quit" => return Some(InputAction::Quit),
            "?" | "help" => return Some(InputAction::Help),
            "state" => return Some(InputAction::ShowState),
            _ => {}
        }

        match waiting {
            WaitingReason::None => None,
            WaitingReason::WaitForClick => {
                if line.is_empty() || line == "c" {
                    self.accept_continue(now)
                } else {
                    Some(InputAction::Rejected(
                        "按回车继续（输入 help 查看命令）".to_string(),
                    ))
                }
            }
            WaitingReason::WaitForChoice { choice_count } => {
                Some(self.interpret_choice(line, *choice_count))
            }
        }
    }

    fn accept_continue(&mut self, now: Instant) -> Option<InputAction> {
        if let Some(last) = self.last_continue
            && now.saturating_duration_since(last) < self.debounce
        {
            debug!("防抖窗口内的继续输入，丢弃");
            return None;
        }
        self.last_continue = Some(now);
        Some(InputAction::Runtime(RuntimeInput::continue_()))
    }

    fn interpret_choice(&self, line: &str, choice_count: usize) -> InputAction {
        if choice_count == 0 {
            return InputAction::Rejected("当前节点需要由程序推进，没有可选的选项".to_string());
        }

        match line.parse::<usize>() {
            Ok(n) if (1..=choice_count).contains(&n) => {
                InputAction::Runtime(RuntimeInput::choice(n - 1))
            }
            _ => InputAction::Rejected(format!("请输入 1-{} 选择", choice_count)),
        }
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}
