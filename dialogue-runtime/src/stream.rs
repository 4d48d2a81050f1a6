//! # Stream 模块
//!
//! 对话流与对话图。
//!
//! ## 设计说明
//!
//! - `DialogueGraph` 持有一组内容的全部流，流之间通过 [`StreamId`] 互相引用
//! - 图中允许出现环（后继或选项目标指回祖先），引擎只沿着引用走，不记录历史
//! - 流的合法性由内容作者负责，引擎不做校验（见 [`diagnostic`](crate::diagnostic)）

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DialogueResult, dangling_stream};
use crate::node::DialogueNode;

/// 流句柄（对话图内的索引）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(usize);

impl StreamId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 对话流
///
/// 有序节点列表，加上一个可选的后继流。
#[derive(Debug, Clone, Default)]
pub struct DialogueStream {
    name: String,
    nodes: Vec<DialogueNode>,
    next: Option<StreamId>,
}

impl DialogueStream {
    /// 创建空流
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            next: None,
        }
    }

    /// 追加节点
    pub fn with_node(mut self, node: DialogueNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// 追加多个节点
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = DialogueNode>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// 设置后继流
    pub fn with_next(mut self, next: StreamId) -> Self {
        self.next = Some(next);
        self
    }

    pub fn push_node(&mut self, node: DialogueNode) {
        self.nodes.push(node);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[DialogueNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [DialogueNode] {
        &mut self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&DialogueNode> {
        self.nodes.get(index)
    }

    pub fn next(&self) -> Option<StreamId> {
        self.next
    }

    pub fn set_next(&mut self, next: Option<StreamId>) {
        self.next = next;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// 对话图
///
/// 一组内容的全部流。生命周期由内容的构建者决定，序列器只共享引用。
#[derive(Debug, Clone, Default)]
pub struct DialogueGraph {
    streams: Vec<DialogueStream>,
}

impl DialogueGraph {
    /// 创建空图
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一个流，返回其句柄
    pub fn add_stream(&mut self, stream: DialogueStream) -> StreamId {
        let id = StreamId(self.streams.len());
        self.streams.push(stream);
        id
    }

    pub fn get(&self, id: StreamId) -> Option<&DialogueStream> {
        self.streams.get(id.0)
    }

    pub fn get_mut(&mut self, id: StreamId) -> Option<&mut DialogueStream> {
        self.streams.get_mut(id.0)
    }

    pub fn contains(&self, id: StreamId) -> bool {
        id.0 < self.streams.len()
    }

    /// 设置（或清除）某个流的后继
    ///
    /// 先加入流、再连线，可以构造任意环。
    pub fn set_next(&mut self, id: StreamId, next: Option<StreamId>) -> DialogueResult<()> {
        if let Some(next) = next
            && !self.contains(next)
        {
            return Err(dangling_stream(next));
        }
        let stream = self.get_mut(id).ok_or_else(|| dangling_stream(id))?;
        stream.set_next(next);
        Ok(())
    }

    /// 按名称查找流
    pub fn find(&self, name: &str) -> Option<StreamId> {
        self.streams
            .iter()
            .position(|s| s.name == name)
            .map(StreamId)
    }

    /// 所有流的句柄
    pub fn ids(&self) -> impl Iterator<Item = StreamId> + '_ {
        (0..self.streams.len()).map(StreamId)
    }

    /// 所有流及其句柄
    pub fn iter(&self) -> impl Iterator<Item = (StreamId, &DialogueStream)> + '_ {
        self.streams.iter().enumerate().map(|(i, s)| (StreamId(i), s))
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_add_and_find() {
        let mut graph = DialogueGraph::new();
        let intro = graph.add_stream(
            DialogueStream::new("intro")
                .with_node(DialogueNode::line("你好"))
                .with_node(DialogueNode::line("再见")),
        );
        let outro = graph.add_stream(DialogueStream::new("outro"));

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.find("intro"), Some(intro));
        assert_eq!(graph.find("outro"), Some(outro));
        assert_eq!(graph.find("missing"), None);
        assert_eq!(graph.get(intro).unwrap().len(), 2);
        assert!(graph.get(outro).unwrap().is_empty());
        assert_eq!(graph.ids().collect::<Vec<_>>(), vec![intro, outro]);
    }

    #[test]
    fn test_graph_allows_cycles() {
        let mut graph = DialogueGraph::new();
        let a = graph.add_stream(DialogueStream::new("a"));
        let b = graph.add_stream(DialogueStream::new("b"));

        graph.set_next(a, Some(b)).unwrap();
        graph.set_next(b, Some(a)).unwrap();
        graph.set_next(a, Some(a)).unwrap();

        assert_eq!(graph.get(a).unwrap().next(), Some(a));
        assert_eq!(graph.get(b).unwrap().next(), Some(a));
    }

    #[test]
    fn test_graph_rejects_dangling_links() {
        let mut graph = DialogueGraph::new();
        let a = graph.add_stream(DialogueStream::new("a"));

        assert!(graph.set_next(a, Some(StreamId::new(5))).is_err());
        assert!(graph.set_next(StreamId::new(5), None).is_err());
        assert_eq!(graph.get(a).unwrap().next(), None);
    }

    #[test]
    fn test_stream_id_display() {
        assert_eq!(StreamId::new(3).to_string(), "#3");
        assert_eq!(serde_json::to_string(&StreamId::new(3)).unwrap(), "3");
    }
}
