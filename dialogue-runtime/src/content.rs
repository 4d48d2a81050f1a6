//! # Content 模块
//!
//! 作者编写的对话内容资源（JSON），构建为 [`DialogueGraph`]。
//!
//! ## 格式
//!
//! ```text
//! {
//!   "start": "intro",
//!   "streams": [
//!     {
//!       "id": "intro",
//!       "next": "farewell",
//!       "nodes": [
//!         { "speaker": "向导", "text": "欢迎", "icon": "icons/guide.png",
//!           "events": ["intro_done"],
//!           "options": [ { "label": "打听", "target": "lore", "events": ["asked"] } ] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! 流通过字符串 ID 互相引用，构建时解析为 [`StreamId`]，因此内容里可以有环。
//! `events` 中的事件名由调用方提供的 binder 绑定为回调：
//! 节点上的事件在节点正常完成时触发，选项上的事件在选中时触发。
//!
//! 本模块不做 IO，读取文件由 Host 负责。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::node::{Callback, DialogueNode, DialogueOption, IconRef, Layout};
use crate::stream::{DialogueGraph, DialogueStream, StreamId};

/// 内容资源根
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentAsset {
    /// 自动播放的流
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// 全部流
    #[serde(default)]
    pub streams: Vec<StreamAsset>,
}

/// 流资源
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamAsset {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeAsset>,
}

/// 节点资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAsset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub layout: Layout,
    /// 有选项时强制为 false
    #[serde(default = "default_click_to_continue")]
    pub click_to_continue: bool,
    /// 节点正常完成时触发的事件
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionAsset>,
}

impl Default for NodeAsset {
    fn default() -> Self {
        Self {
            speaker: None,
            text: None,
            icon: None,
            layout: Layout::default(),
            click_to_continue: default_click_to_continue(),
            events: Vec::new(),
            options: Vec::new(),
        }
    }
}

/// 选项资源
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionAsset {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// 选中时触发的事件
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
}

fn default_click_to_continue() -> bool {
    true
}

/// 构建好的内容
#[derive(Debug, Clone)]
pub struct Content {
    /// 对话图
    pub graph: DialogueGraph,
    /// 自动播放的流
    pub start: Option<StreamId>,
}

impl ContentAsset {
    /// 从 JSON 文本解析
    pub fn from_json(text: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(text)?)
    }

    /// 序列化为格式化的 JSON
    pub fn to_json_pretty(&self) -> Result<String, ContentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 构建对话图，忽略所有事件
    pub fn build(self) -> Result<Content, ContentError> {
        self.build_with(|_| None)
    }

    /// 构建对话图
    ///
    /// `bind` 为每个事件名返回回调；返回 None 的事件不绑定。
    pub fn build_with(
        self,
        mut bind: impl FnMut(&str) -> Option<Callback>,
    ) -> Result<Content, ContentError> {
        // 第一遍：分配句柄
        let mut ids: HashMap<String, StreamId> = HashMap::new();
        for (index, stream) in self.streams.iter().enumerate() {
            if ids.insert(stream.id.clone(), StreamId::new(index)).is_some() {
                return Err(ContentError::DuplicateStream {
                    id: stream.id.clone(),
                });
            }
        }

        let resolve = |name: &str, referenced_by: String| {
            ids.get(name)
                .copied()
                .ok_or_else(|| ContentError::UnknownStream {
                    id: name.to_string(),
                    referenced_by,
                })
        };

        // 第二遍：解析引用并构建
        let mut graph = DialogueGraph::new();
        for stream_asset in self.streams {
            let mut stream = DialogueStream::new(&stream_asset.id);
            if let Some(next) = &stream_asset.next {
                stream.set_next(Some(resolve(next, format!("流 '{}'", stream_asset.id))?));
            }

            for (node_index, node_asset) in stream_asset.nodes.into_iter().enumerate() {
                let mut node = DialogueNode::new().with_layout(node_asset.layout);
                if let Some(speaker) = node_asset.speaker {
                    node = node.with_speaker(speaker);
                }
                if let Some(text) = node_asset.text {
                    node = node.with_text(text);
                }
                if let Some(icon) = node_asset.icon {
                    node = node.with_icon(IconRef::new(icon));
                }
                node.set_requires_explicit_choice(!node_asset.click_to_continue);

                for event in &node_asset.events {
                    if let Some(callback) = bind(event) {
                        node.on_complete_mut().push_shared(callback);
                    }
                }

                for option_asset in node_asset.options {
                    let mut option = DialogueOption::new(option_asset.label);
                    if let Some(target) = &option_asset.target {
                        let referenced_by =
                            format!("流 '{}' 第 {} 个节点的选项", stream_asset.id, node_index + 1);
                        option = option.with_target(resolve(target, referenced_by)?);
                    }
                    for event in &option_asset.events {
                        if let Some(callback) = bind(event) {
                            option.on_select_mut().push_shared(callback);
                        }
                    }
                    node.push_option(option);
                }

                stream.push_node(node);
            }

            graph.add_stream(stream);
        }

        let start = match &self.start {
            Some(name) => Some(resolve(name, "start".to_string())?),
            None => None,
        };

        Ok(Content { graph, start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SAMPLE: &str = r#"
{
  "start": "intro",
  "streams": [
    {
      "id": "intro",
      "next": "outro",
      "nodes": [
        { "speaker": "向导", "text": "欢迎", "icon": "icons/guide.png", "events": ["greeted"] },
        {
          "text": "想听故事吗？",
          "options": [
            { "label": "好", "target": "lore", "events": ["asked"] },
            { "label": "不了" }
          ]
        }
      ]
    },
    { "id": "lore", "next": "intro", "nodes": [ { "text": "很久以前……" } ] },
    { "id": "outro", "nodes": [ { "text": "再见", "click_to_continue": false } ] }
  ]
}
"#;

    #[test]
    fn test_build_sample() {
        let content = ContentAsset::from_json(SAMPLE).unwrap().build().unwrap();
        let graph = &content.graph;

        let intro = graph.find("intro").unwrap();
        let lore = graph.find("lore").unwrap();
        let outro = graph.find("outro").unwrap();
        assert_eq!(content.start, Some(intro));

        let intro_stream = graph.get(intro).unwrap();
        assert_eq!(intro_stream.next(), Some(outro));
        assert_eq!(intro_stream.len(), 2);

        let first = intro_stream.node(0).unwrap();
        assert_eq!(first.speaker(), Some("向导"));
        assert_eq!(first.icon().map(IconRef::as_str), Some("icons/guide.png"));
        assert!(first.click_to_continue());

        let second = intro_stream.node(1).unwrap();
        assert!(second.requires_explicit_choice());
        assert_eq!(second.options()[0].target(), Some(lore));
        assert_eq!(second.options()[1].target(), None);

        // 环：lore -> intro
        assert_eq!(graph.get(lore).unwrap().next(), Some(intro));

        let gated = graph.get(outro).unwrap().node(0).unwrap();
        assert!(gated.requires_explicit_choice());
    }

    #[test]
    fn test_build_binds_events() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let content = ContentAsset::from_json(SAMPLE)
            .unwrap()
            .build_with(|name| {
                let sink = Rc::clone(&sink);
                let name = name.to_string();
                let callback: Callback = Rc::new(move || sink.borrow_mut().push(name.clone()));
                Some(callback)
            })
            .unwrap();

        let intro = content.graph.get(content.start.unwrap()).unwrap();
        intro.node(0).unwrap().on_complete().invoke_all();
        intro.node(1).unwrap().options()[0].select();

        assert_eq!(*fired.borrow(), vec!["greeted", "asked"]);
    }

    #[test]
    fn test_unbound_events_are_skipped() {
        let content = ContentAsset::from_json(SAMPLE).unwrap().build().unwrap();
        let intro = content.graph.get(content.start.unwrap()).unwrap();
        assert!(intro.node(0).unwrap().on_complete().is_empty());
    }

    #[test]
    fn test_duplicate_stream_id() {
        let json = r#"{ "streams": [ { "id": "a" }, { "id": "a" } ] }"#;
        let err = ContentAsset::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(err, ContentError::DuplicateStream { id } if id == "a"));
    }

    #[test]
    fn test_unknown_references() {
        let json = r#"{ "streams": [ { "id": "a", "next": "ghost" } ] }"#;
        let err = ContentAsset::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(err, ContentError::UnknownStream { ref id, .. } if id == "ghost"));

        let json = r#"{ "streams": [ { "id": "a", "nodes": [ { "options": [ { "label": "x", "target": "ghost" } ] } ] } ] }"#;
        let err = ContentAsset::from_json(json).unwrap().build().unwrap_err();
        assert!(err.to_string().contains("第 1 个节点的选项"));

        let json = r#"{ "start": "ghost", "streams": [] }"#;
        let err = ContentAsset::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(err, ContentError::UnknownStream { ref referenced_by, .. } if referenced_by == "start"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ContentAsset::from_json("{ not json"),
            Err(ContentError::Json(_))
        ));
    }

    #[test]
    fn test_asset_json_roundtrip_keeps_defaults_compact() {
        let asset = ContentAsset {
            start: None,
            streams: vec![StreamAsset {
                id: "s".to_string(),
                next: None,
                nodes: vec![NodeAsset {
                    text: Some("嗨".to_string()),
                    ..NodeAsset::default()
                }],
            }],
        };
        let json = asset.to_json_pretty().unwrap();
        assert!(!json.contains("start"));
        assert_eq!(ContentAsset::from_json(&json).unwrap(), asset);
    }
}
