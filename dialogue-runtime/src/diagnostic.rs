//! # 诊断模块
//!
//! 对话图的静态检查，不依赖 IO，也不会被序列器调用。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 直接检查构建好的 [`DialogueGraph`]，内容资源与代码构造的图走同一套检查

use std::collections::VecDeque;

use crate::node::Layout;
use crate::stream::{DialogueGraph, StreamId};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 所在流的名称
    pub stream: String,
    /// 节点序号（如果可定位，从 1 开始）
    pub node: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选）
    pub detail: Option<String>,
}

impl Diagnostic {
    fn with_level(
        level: DiagnosticLevel,
        stream: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            stream: stream.into(),
            node: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, stream, message)
    }

    /// 创建警告诊断
    pub fn warn(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, stream, message)
    }

    /// 创建信息诊断
    pub fn info(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, stream, message)
    }

    /// 设置节点序号（从 1 开始）
    pub fn with_node(mut self, node: usize) -> Self {
        self.node = Some(node);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.stream)?;
        if let Some(node) = self.node {
            write!(f, "#{}", node)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

//=============================================================================
// 对话图分析 API
//=============================================================================

/// 分析对话图，返回诊断结果
///
/// 执行以下检查：
/// - 悬空的流引用（`next` 或选项目标不在图中）
/// - 只由空流组成的后继环（序列器会在绕满一圈后放弃）
/// - 空流、竖排布局的选项、要求选择却没有选项的节点
/// - 从 `start` 不可达的流
/// - 含有内容的后继环（会重复播放）
///
/// # 参数
///
/// - `graph`: 对话图
/// - `start`: 自动播放的流（None 时跳过可达性检查）
pub fn analyze_graph(graph: &DialogueGraph, start: Option<StreamId>) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    check_references(graph, &mut result);
    check_nodes(graph, &mut result);
    check_next_cycles(graph, &mut result);

    if let Some(start) = start {
        check_reachability(graph, start, &mut result);
    }

    result
}

fn stream_name(graph: &DialogueGraph, id: StreamId) -> String {
    graph
        .get(id)
        .map(|s| s.name().to_string())
        .unwrap_or_else(|| id.to_string())
}

/// 悬空引用
fn check_references(graph: &DialogueGraph, result: &mut DiagnosticResult) {
    for (_, stream) in graph.iter() {
        if let Some(next) = stream.next()
            && !graph.contains(next)
        {
            result.push(
                Diagnostic::error(stream.name(), format!("后继流 {} 不存在", next))
                    .with_detail("next 引用了其他图的句柄"),
            );
        }

        for (index, node) in stream.nodes().iter().enumerate() {
            for option in node.options() {
                if let Some(target) = option.target()
                    && !graph.contains(target)
                {
                    result.push(
                        Diagnostic::error(
                            stream.name(),
                            format!("选项 '{}' 的目标流 {} 不存在", option.label(), target),
                        )
                        .with_node(index + 1),
                    );
                }
            }
        }
    }
}

/// 节点级检查
fn check_nodes(graph: &DialogueGraph, result: &mut DiagnosticResult) {
    for (_, stream) in graph.iter() {
        if stream.is_empty() {
            result.push(
                Diagnostic::warn(stream.name(), "空流")
                    .with_detail("播放时会立即完成并串联到后继流"),
            );
        }

        for (index, node) in stream.nodes().iter().enumerate() {
            if node.has_options() && node.layout() == Layout::Vertical {
                result.push(
                    Diagnostic::warn(stream.name(), "竖排布局尚未支持，选项按钮不会渲染")
                        .with_node(index + 1),
                );
            }

            if node.requires_explicit_choice() && !node.has_options() {
                result.push(
                    Diagnostic::warn(stream.name(), "节点要求显式选择但没有选项")
                        .with_node(index + 1)
                        .with_detail("只有程序调用 advance 才能离开该节点"),
                );
            }
        }
    }
}

/// 后继链上的环
///
/// 每个流最多一条后继边，沿 `next` 走到已访问过的流即可找出全部环。
fn check_next_cycles(graph: &DialogueGraph, result: &mut DiagnosticResult) {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; graph.len()];

    for origin in graph.ids() {
        let mut path: Vec<StreamId> = Vec::new();
        let mut cursor = Some(origin);

        while let Some(id) = cursor {
            if !graph.contains(id) {
                break;
            }
            match marks[id.index()] {
                Mark::Done => break,
                Mark::OnPath => {
                    let Some(start) = path.iter().position(|p| *p == id) else {
                        break;
                    };
                    report_cycle(graph, &path[start..], result);
                    break;
                }
                Mark::Unvisited => {
                    marks[id.index()] = Mark::OnPath;
                    path.push(id);
                    cursor = graph.get(id).and_then(|s| s.next());
                }
            }
        }

        for id in path {
            marks[id.index()] = Mark::Done;
        }
    }
}

fn report_cycle(graph: &DialogueGraph, cycle: &[StreamId], result: &mut DiagnosticResult) {
    let Some(&head) = cycle.first() else {
        return;
    };

    let names: Vec<String> = cycle
        .iter()
        .chain(std::iter::once(&head))
        .map(|id| stream_name(graph, *id))
        .collect();
    let detail = names.join(" -> ");

    let all_empty = cycle
        .iter()
        .all(|id| graph.get(*id).is_none_or(|s| s.is_empty()));

    let diagnostic = if all_empty {
        Diagnostic::error(stream_name(graph, head), "后继环中的流全部为空")
    } else {
        Diagnostic::info(stream_name(graph, head), "后继环会重复播放")
    };
    result.push(diagnostic.with_detail(detail));
}

/// 从 start 出发，沿后继与选项目标不可达的流
fn check_reachability(graph: &DialogueGraph, start: StreamId, result: &mut DiagnosticResult) {
    if !graph.contains(start) {
        result.push(Diagnostic::error(
            start.to_string(),
            "起始流不存在于当前对话图中",
        ));
        return;
    }

    let mut reached = vec![false; graph.len()];
    let mut queue = VecDeque::from([start]);
    reached[start.index()] = true;

    while let Some(id) = queue.pop_front() {
        let Some(stream) = graph.get(id) else {
            continue;
        };
        let targets = stream.next().into_iter().chain(
            stream
                .nodes()
                .iter()
                .flat_map(|n| n.options().iter().filter_map(|o| o.target())),
        );
        for target in targets {
            if graph.contains(target) && !reached[target.index()] {
                reached[target.index()] = true;
                queue.push_back(target);
            }
        }
    }

    for (id, stream) in graph.iter() {
        if !reached[id.index()] {
            result.push(Diagnostic::info(stream.name(), "从起始流不可达"));
        }
    }
}
