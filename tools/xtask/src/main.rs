//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `content-check`: 检查对话内容文件（JSON 结构、流引用、图诊断、头像资源）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::{Parser, Subcommand};
use dialogue_runtime::{ContentAsset, DiagnosticResult, analyze_graph};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,

    /// 检查对话内容文件
    ///
    /// 不带参数：检查 dialogue-cli/assets/ 下所有 .json 内容文件
    /// 带路径参数：检查指定文件或目录
    ContentCheck {
        /// 内容文件或目录
        path: Option<PathBuf>,
    },
}

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckAll => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        Commands::ContentCheck { path } => content_check(path.as_deref())?,
    }

    Ok(())
}

//=============================================================================
// content-check 命令实现
//=============================================================================

/// 默认内容目录（相对于 workspace root）
const DEFAULT_CONTENT_DIR: &str = "dialogue-cli/assets";

/// 内容检查结果
#[derive(Default)]
struct ContentCheckResult {
    /// 检查的文件数量
    files_checked: usize,
    /// 读取或构建失败的数量
    load_errors: usize,
    /// 每个文件的图诊断结果
    reports: Vec<FileReport>,
    /// 缺失的头像文件
    missing_icons: Vec<MissingIcon>,
}

/// 单个文件的诊断
struct FileReport {
    file: String,
    diagnostics: DiagnosticResult,
}

impl FileReport {
    /// 文件名作为标题，诊断逐条缩进在下面
    fn render(&self) -> String {
        let mut out = format!("{}:", self.file);
        for diag in &self.diagnostics.diagnostics {
            for line in diag.to_string().lines() {
                out.push_str("\n  ");
                out.push_str(line);
            }
        }
        out
    }
}

impl ContentCheckResult {
    fn error_count(&self) -> usize {
        self.load_errors
            + self
                .reports
                .iter()
                .map(|r| r.diagnostics.error_count())
                .sum::<usize>()
    }

    fn warn_count(&self) -> usize {
        self.missing_icons.len()
            + self
                .reports
                .iter()
                .map(|r| r.diagnostics.warn_count())
                .sum::<usize>()
    }
}

struct MissingIcon {
    file: String,
    stream: String,
    path: String,
}

/// 执行内容检查
fn content_check(path: Option<&Path>) -> anyhow::Result<()> {
    let root = path.unwrap_or(Path::new(DEFAULT_CONTENT_DIR));

    let files = if root.is_file() {
        vec![root.to_path_buf()]
    } else if root.is_dir() {
        collect_content_files(root)?
    } else {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定内容路径",
            root.display()
        );
    };

    if files.is_empty() {
        eprintln!("未找到内容文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个内容文件...\n", files.len());

    let mut result = ContentCheckResult::default();
    for file in &files {
        check_content_file(file, &mut result);
    }

    print_check_result(&result);

    if result.error_count() > 0 {
        anyhow::bail!("内容检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有内容文件
fn collect_content_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// 检查单个内容文件
fn check_content_file(file: &Path, result: &mut ContentCheckResult) {
    let file_id = file.display().to_string();
    result.files_checked += 1;

    let text = match std::fs::read_to_string(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", file_id, e);
            result.load_errors += 1;
            return;
        }
    };

    let asset = match ContentAsset::from_json(&text) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", file_id, e);
            result.load_errors += 1;
            return;
        }
    };

    // 头像路径相对于内容文件所在目录
    let base = file.parent().unwrap_or(Path::new("."));
    for stream in &asset.streams {
        for icon in stream.nodes.iter().filter_map(|n| n.icon.as_deref()) {
            if !base.join(icon).exists() {
                result.missing_icons.push(MissingIcon {
                    file: file_id.clone(),
                    stream: stream.id.clone(),
                    path: icon.to_string(),
                });
            }
        }
    }

    let content = match asset.build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", file_id, e);
            result.load_errors += 1;
            return;
        }
    };

    result.reports.push(FileReport {
        file: file_id,
        diagnostics: analyze_graph(&content.graph, content.start),
    });
}

/// 输出检查结果
fn print_check_result(result: &ContentCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个内容文件", result.files_checked);
    eprintln!();

    for report in result.reports.iter().filter(|r| !r.diagnostics.is_empty()) {
        eprintln!("{}", report.render());
    }

    for mi in &result.missing_icons {
        eprintln!("[WARN] {} ({}): 头像不存在 {}", mi.file, mi.stream, mi.path);
    }

    let error_count = result.error_count();
    let warn_count = result.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
