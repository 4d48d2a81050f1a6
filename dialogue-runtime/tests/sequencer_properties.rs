//! # 序列器行为集成测试
//!
//! 通过 CommandBuffer 记录表现层调用，验证播放、分支、串联与停止的行为。

use std::cell::RefCell;
use std::rc::Rc;

use dialogue_runtime::{
    Callback, CommandBuffer, ContentAsset, DialogueError, DialogueGraph, DialogueNode,
    DialogueOption, DialogueSequencer, DialogueStream, Layout, RuntimeInput, StreamId,
    WaitingReason, transcript,
};
use insta::assert_snapshot;

type Log = Rc<RefCell<Vec<String>>>;

fn record(log: &Log, entry: &str) -> impl Fn() + 'static {
    let log = Rc::clone(log);
    let entry = entry.to_string();
    move || log.borrow_mut().push(entry.clone())
}

fn run(sequencer: &DialogueSequencer<CommandBuffer>) -> String {
    transcript(sequencer.presenter().commands())
}

/// 线性流：N 次 advance 依次访问全部节点，然后空闲
#[test]
fn test_linear_stream_visits_every_node() {
    let log: Log = Rc::default();
    let mut graph = DialogueGraph::new();
    let stream = graph.add_stream(DialogueStream::new("linear").with_nodes(
        ["一", "二", "三"]
            .into_iter()
            .map(|t| DialogueNode::line(t).with_on_complete(record(&log, t))),
    ));

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(stream).unwrap();

    for expected in 0..3 {
        assert_eq!(sequencer.state().current_node_index, expected);
        sequencer.advance();
    }

    assert!(sequencer.is_idle());
    assert_eq!(sequencer.presenter().shown_texts(), vec!["一", "二", "三"]);
    assert_eq!(*log.borrow(), vec!["一", "二", "三"]);
}

/// [Hi, Bye]，没有后继
#[test]
fn test_hi_bye_hides_exactly_once() {
    let mut graph = DialogueGraph::new();
    let stream = graph.add_stream(
        DialogueStream::new("greeting")
            .with_node(DialogueNode::line("Hi"))
            .with_node(DialogueNode::line("Bye")),
    );

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(stream).unwrap();
    sequencer.advance();
    assert_eq!(sequencer.current_node().and_then(DialogueNode::text), Some("Bye"));

    sequencer.advance();
    assert!(sequencer.is_idle());
    assert_eq!(sequencer.presenter().hide_count(), 1);
    assert_snapshot!(run(&sequencer), @r"
    open
    show Hi
    show Bye
    hide
    ");
}

/// 串联：A 播完直接呈现 B 的首节点，中间不隐藏
#[test]
fn test_chain_presents_successor_without_hiding() {
    let mut graph = DialogueGraph::new();
    let b = graph.add_stream(
        DialogueStream::new("b")
            .with_node(DialogueNode::line("b1").with_speaker("乙"))
            .with_node(DialogueNode::line("b2")),
    );
    let a = graph.add_stream(
        DialogueStream::new("a")
            .with_node(DialogueNode::line("a1").with_speaker("甲"))
            .with_next(b),
    );

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(a).unwrap();
    sequencer.advance();

    assert_eq!(sequencer.active_stream(), Some(b));
    assert_eq!(sequencer.state().current_node_index, 0);
    assert_eq!(sequencer.presenter().hide_count(), 0);
    assert_snapshot!(run(&sequencer), @r"
    open
    show [甲] a1
    open
    show [乙] b1
    ");
}

/// 自环：后继是自己的流反复重播首节点
#[test]
fn test_self_loop_replays_first_node() {
    let log: Log = Rc::default();
    let mut graph = DialogueGraph::new();
    let looped = graph.add_stream(
        DialogueStream::new("loop").with_node(DialogueNode::line("又来了").with_on_complete(record(&log, "done"))),
    );
    graph.set_next(looped, Some(looped)).unwrap();

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(looped).unwrap();

    for _ in 0..3 {
        sequencer.advance();
        assert_eq!(sequencer.active_stream(), Some(looped));
        assert_eq!(sequencer.current_node().and_then(DialogueNode::text), Some("又来了"));
    }

    assert_eq!(sequencer.presenter().shown_texts().len(), 4);
    assert_eq!(sequencer.presenter().hide_count(), 0);
    assert_eq!(log.borrow().len(), 3);
}

/// 选中带目标的选项：不触发当前节点的完成回调，立即呈现目标流
#[test]
fn test_branch_skips_completion_and_presents_target() {
    let log: Log = Rc::default();
    let mut graph = DialogueGraph::new();
    let shop = graph.add_stream(DialogueStream::new("shop").with_node(DialogueNode::line("欢迎光临")));
    let main = graph.add_stream(
        DialogueStream::new("main").with_node(
            DialogueNode::line("去哪？")
                .with_on_complete(record(&log, "main.complete"))
                .with_option(
                    DialogueOption::new("商店")
                        .with_target(shop)
                        .with_action(record(&log, "shop.selected")),
                )
                .with_option(DialogueOption::new("离开")),
        ),
    );

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(main).unwrap();
    assert_eq!(*sequencer.waiting(), WaitingReason::choice(2));

    sequencer.select_option(0).unwrap();

    assert_eq!(*log.borrow(), vec!["shop.selected"]);
    assert_eq!(sequencer.active_stream(), Some(shop));
    assert_snapshot!(run(&sequencer), @r"
    open
    show 去哪？ (商店 | 离开)
    options Horizontal: 商店[0.00-0.50] 离开[0.50-1.00]
    clear-options
    hide
    open
    show 欢迎光临
    ");
}

/// 分支到空流：立即结束
#[test]
fn test_branch_to_empty_stream_terminates() {
    let mut graph = DialogueGraph::new();
    let empty = graph.add_stream(DialogueStream::new("empty"));
    let main = graph.add_stream(DialogueStream::new("main").with_node(
        DialogueNode::line("?").with_option(DialogueOption::new("走").with_target(empty)),
    ));

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(main).unwrap();
    sequencer.handle_input(RuntimeInput::choice(0)).unwrap();

    assert!(sequencer.is_idle());
    assert_eq!(sequencer.presenter().hide_count(), 2);
}

/// 播放中启动另一个流：丢弃剩余节点与后继链，不触发完成回调
#[test]
fn test_play_stream_interrupt_discards_successor() {
    let log: Log = Rc::default();
    let mut graph = DialogueGraph::new();
    let c = graph.add_stream(DialogueStream::new("c").with_node(DialogueNode::line("C")));
    let a = graph.add_stream(
        DialogueStream::new("a")
            .with_node(DialogueNode::line("A1").with_on_complete(record(&log, "a1")))
            .with_node(DialogueNode::line("A2").with_on_complete(record(&log, "a2")))
            .with_next(c),
    );
    let b = graph.add_stream(DialogueStream::new("b").with_node(DialogueNode::line("B")));

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(a).unwrap();
    sequencer.play_stream(b).unwrap();
    assert_eq!(sequencer.active_stream(), Some(b));

    sequencer.advance();

    assert!(sequencer.is_idle());
    assert!(log.borrow().is_empty());
    assert!(!sequencer.presenter().shown_texts().contains(&"C".to_string()));
    assert_snapshot!(run(&sequencer), @r"
    open
    show A1
    hide
    open
    show B
    hide
    ");
}

/// 停在选项节点上：先销毁按钮再隐藏，下次播放不再清理
#[test]
fn test_stop_clears_options_before_hiding() {
    let mut graph = DialogueGraph::new();
    let menu = graph.add_stream(DialogueStream::new("menu").with_node(
        DialogueNode::line("选吧").with_option(DialogueOption::new("好")),
    ));

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(menu).unwrap();
    sequencer.stop_active_stream();
    sequencer.play_stream(menu).unwrap();

    assert_snapshot!(run(&sequencer), @r"
    open
    show 选吧 (好)
    options Horizontal: 好[0.00-1.00]
    clear-options
    hide
    open
    show 选吧 (好)
    options Horizontal: 好[0.00-1.00]
    ");
}

/// 停止是幂等的
#[test]
fn test_stop_is_idempotent() {
    let mut graph = DialogueGraph::new();
    let stream = graph.add_stream(DialogueStream::new("s").with_node(DialogueNode::line("嗯")));

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.stop_active_stream();
    assert_eq!(sequencer.presenter().hide_count(), 0);

    sequencer.play_stream(stream).unwrap();
    sequencer.stop_active_stream();
    sequencer.stop_active_stream();

    assert!(sequencer.is_idle());
    assert!(sequencer.current_node().is_none());
    assert_eq!(sequencer.presenter().hide_count(), 1);
}

/// 需要显式选择的节点忽略继续输入，但响应选项
#[test]
fn test_explicit_choice_ignores_continue() {
    let mut graph = DialogueGraph::new();
    let stream = graph.add_stream(
        DialogueStream::new("quiz")
            .with_node(DialogueNode::line("答案是？").with_option(DialogueOption::new("42")))
            .with_node(DialogueNode::line("正确")),
    );

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(stream).unwrap();

    assert!(!sequencer.signal_continue());
    sequencer.handle_input(RuntimeInput::continue_()).unwrap();
    assert!(!sequencer.state().can_advance);
    assert_eq!(sequencer.state().current_node_index, 0);

    sequencer.select_option(0).unwrap();
    assert_eq!(sequencer.current_node().and_then(DialogueNode::text), Some("正确"));
    assert_eq!(*sequencer.waiting(), WaitingReason::WaitForClick);
}

/// 竖排布局：正文照常显示，不渲染选项按钮
#[test]
fn test_vertical_layout_presents_text_only() {
    let mut graph = DialogueGraph::new();
    let stream = graph.add_stream(
        DialogueStream::new("v").with_node(
            DialogueNode::line("竖排")
                .with_layout(Layout::Vertical)
                .with_option(DialogueOption::new("上"))
                .with_option(DialogueOption::new("下")),
        ),
    );

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(stream).unwrap();

    assert_eq!(*sequencer.waiting(), WaitingReason::choice(2));
    assert_snapshot!(run(&sequencer), @r"
    open
    show 竖排 (上 | 下)
    ");
}

/// 缺少选项按钮容器：节点照常呈现
#[test]
fn test_missing_option_bounds_still_presents_node() {
    let mut graph = DialogueGraph::new();
    let stream = graph.add_stream(
        DialogueStream::new("s")
            .with_node(DialogueNode::line("选一个").with_option(DialogueOption::new("A"))),
    );

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::without_option_bounds());
    sequencer.play_stream(stream).unwrap();

    assert_eq!(sequencer.presenter().last_shown_text().as_deref(), Some("选一个"));
    assert_eq!(sequencer.presenter().commands().len(), 2);

    // 选项本身仍然可选
    sequencer.select_option(0).unwrap();
    assert!(sequencer.is_idle());
}

/// 未知句柄：返回 InvalidArgument，状态不变
#[test]
fn test_unknown_stream_leaves_state_unchanged() {
    let mut graph = DialogueGraph::new();
    let stream = graph.add_stream(DialogueStream::new("s").with_node(DialogueNode::line("在播")));

    let mut sequencer = DialogueSequencer::new(graph, CommandBuffer::new());
    sequencer.play_stream(stream).unwrap();
    let before = sequencer.state().clone();
    let commands_before = sequencer.presenter().commands().len();

    let err = sequencer.play_stream(StreamId::new(99)).unwrap_err();
    assert!(matches!(err, DialogueError::InvalidArgument { .. }));
    assert_eq!(*sequencer.state(), before);
    assert_eq!(sequencer.presenter().commands().len(), commands_before);
}

/// 从 JSON 内容驱动完整会话
#[test]
fn test_content_driven_session() {
    let json = r#"
{
  "start": "gate",
  "streams": [
    {
      "id": "gate",
      "nodes": [
        { "speaker": "守卫", "text": "站住", "events": ["gate.greeted"] },
        {
          "speaker": "守卫",
          "text": "通行证？",
          "options": [
            { "label": "出示", "target": "pass", "events": ["pass.shown"] },
            { "label": "没有" }
          ]
        }
      ],
      "next": "refused"
    },
    { "id": "pass", "nodes": [ { "text": "请进" } ] },
    { "id": "refused", "nodes": [ { "speaker": "守卫", "text": "回去吧" } ] }
  ]
}
"#;

    let fired: Log = Rc::default();
    let sink = Rc::clone(&fired);
    let content = ContentAsset::from_json(json)
        .unwrap()
        .build_with(move |event| {
            let sink = Rc::clone(&sink);
            let event = event.to_string();
            let callback: Callback = Rc::new(move || sink.borrow_mut().push(event.clone()));
            Some(callback)
        })
        .unwrap();
    let start = content.start.unwrap();

    let mut sequencer = DialogueSequencer::new(content.graph, CommandBuffer::new());
    sequencer.play_stream(start).unwrap();
    sequencer.handle_input(RuntimeInput::continue_()).unwrap();
    sequencer.handle_input(RuntimeInput::choice(1)).unwrap();
    sequencer.handle_input(RuntimeInput::continue_()).unwrap();

    assert!(sequencer.is_idle());
    assert_eq!(*fired.borrow(), vec!["gate.greeted"]);
    assert_snapshot!(run(&sequencer), @r"
    open
    show [守卫] 站住
    show [守卫] 通行证？ (出示 | 没有)
    options Horizontal: 出示[0.00-0.50] 没有[0.50-1.00]
    open
    clear-options
    show [守卫] 回去吧
    hide
    ");
}
