//! # dialogue-cli
//!
//! 在终端里播放对话内容。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p dialogue-cli
//! cargo run -p dialogue-cli -- dialogue-cli/assets/demo.json --start shop
//! cargo run -p dialogue-cli -- --check
//! cargo run -p dialogue-cli -- --transcript session.txt --log-level debug
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dialogue_cli::{
    CliConfig, ConsolePresenter, InputManager, Recorder, Session, load_content, resolve_start,
};
use dialogue_runtime::{DialogueSequencer, analyze_graph, transcript};
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(name = "dialogue-cli")]
#[command(about = "在终端里播放分支对话")]
#[command(version)]
struct Args {
    /// 对话内容文件（覆盖配置中的 content_path）
    content: Option<PathBuf>,

    /// 配置文件
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 起始流 ID
    #[arg(short, long)]
    start: Option<String>,

    /// 日志级别（trace/debug/info/warn/error）
    #[arg(long)]
    log_level: Option<String>,

    /// 继续输入的防抖窗口（毫秒）
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// 每次等待输入前打印序列器状态
    #[arg(long)]
    show_state: bool,

    /// 只检查内容，不播放
    #[arg(long)]
    check: bool,

    /// 会话结束后把表现层调用写入文件
    #[arg(long)]
    transcript: Option<PathBuf>,
}

impl Args {
    /// 命令行参数覆盖配置文件
    fn apply(&self, config: &mut CliConfig) {
        if let Some(content) = &self.content {
            config.content_path = content.clone();
        }
        if let Some(start) = &self.start {
            config.start_stream = Some(start.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(ms) = self.debounce_ms {
            config.continue_debounce_ms = ms;
        }
        if self.show_state {
            config.show_state = true;
        }
    }
}

fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("错误: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn real_main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = CliConfig::try_load(&args.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => CliConfig::default(),
    };
    args.apply(&mut config);

    init_tracing(config.max_level().unwrap_or(Level::INFO));
    match loaded {
        Ok(_) => info!(path = ?args.config, "配置文件加载成功"),
        Err(e) => warn!(error = %e, "使用默认配置"),
    }
    config.validate()?;

    let text = fs::read_to_string(&config.content_path)
        .with_context(|| format!("无法读取内容文件 {:?}", config.content_path))?;
    let content = load_content(&text)
        .with_context(|| format!("内容文件无效 {:?}", config.content_path))?;
    let start = resolve_start(&content, config.start_stream.as_deref())?;
    info!(
        streams = content.graph.len(),
        start = ?start,
        "内容加载完成"
    );

    if args.check {
        let result = analyze_graph(&content.graph, start);
        for diag in &result.diagnostics {
            eprintln!("{}", diag);
        }
        if result.has_errors() {
            anyhow::bail!("内容检查发现 {} 个错误", result.error_count());
        }
        eprintln!("检查通过: {} 个警告", result.warn_count());
        return Ok(());
    }

    let start = start.context("没有起始流：请在内容中设置 start 或使用 --start")?;

    let presenter = Recorder::new(ConsolePresenter::new(io::stdout()));
    let mut sequencer = DialogueSequencer::new(content.graph, presenter);
    sequencer.play_stream(start)?;

    let input = InputManager::new(Duration::from_millis(config.continue_debounce_ms));
    let mut session = Session::new(sequencer, input, config.show_state);
    let end = session.run(io::stdin().lock(), &mut io::stdout())?;
    info!(end = ?end, "会话结束");

    let (_, record) = session.shutdown().into_parts();
    if let Some(path) = &args.transcript {
        fs::write(path, transcript(record.commands()))
            .with_context(|| format!("无法写入 transcript {:?}", path))?;
        info!(path = ?path, commands = record.commands().len(), "transcript 已写入");
    }

    Ok(())
}
