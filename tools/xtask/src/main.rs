//! # xtask
//!
//! 本仓库的维护命令，通过 `.cargo/config.toml` 中的别名调用。
//!
//! | 命令            | 作用                                             |
//! |-----------------|--------------------------------------------------|
//! | `check-all`     | 格式、lint、全部测试，最后检查 `scripts/`        |
//! | `cov-rules`     | 只统计 reply-rules 的覆盖率                      |
//! | `cov-workspace` | 统计除 xtask 以外所有 crate 的覆盖率             |
//! | `script-check`  | 检查 `.dsl` 规则脚本与 `rules.json` 路由         |

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::{Context as _, bail};
use reply_rules::{DiagnosticResult, Parser, RulesConfig, check_source};
use walkdir::WalkDir;

const COVERAGE_REPORT: &str = "target/llvm-cov/html/index.html";

fn main() -> ExitCode {
    match dispatch(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xtask: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(args: Vec<String>) -> anyhow::Result<()> {
    let task = args.first().map(String::as_str).unwrap_or("help");
    let operand = args.get(1).map(String::as_str);

    match task {
        "check-all" => {
            cargo(&["fmt", "--all", "--", "--check"])?;
            cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
            cargo(&["test", "--workspace"])?;
            script_check(None)
        }
        "cov-rules" => coverage(&["-p", "reply-rules"]),
        "cov-workspace" => coverage(&["--workspace", "--exclude", "xtask"]),
        "script-check" => script_check(operand),
        "help" | "-h" | "--help" => {
            eprintln!("{HELP}");
            Ok(())
        }
        other => bail!("未知命令 '{other}'，运行 `cargo xtask help` 查看可用命令"),
    }
}

/// 运行一条 cargo 命令，非零退出码视为失败
fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let line = format!("cargo {}", args.join(" "));
    eprintln!("\n$ {line}");
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("无法启动 {line}"))?;
    if !status.success() {
        bail!("{line} 退出码 {status}");
    }
    Ok(())
}

/// 生成 HTML 覆盖率报告，`scope` 为包选择参数
fn coverage(scope: &[&str]) -> anyhow::Result<()> {
    let installed = Command::new("cargo")
        .args(["llvm-cov", "--version"])
        .output()
        .is_ok_and(|out| out.status.success());
    if !installed {
        bail!(
            "覆盖率需要 cargo-llvm-cov：\n  \
             cargo install cargo-llvm-cov\n  \
             rustup component add llvm-tools-preview"
        );
    }

    let mut args = vec!["llvm-cov"];
    args.extend_from_slice(scope);
    args.push("--html");
    cargo(&args)?;

    eprintln!("\n报告位置: {COVERAGE_REPORT}");
    Ok(())
}

const HELP: &str = r#"cargo xtask <命令> [参数]

  check-all            fmt --check、clippy -D warnings、test，然后检查 scripts/
  cov-rules            reply-rules 覆盖率（需要 cargo-llvm-cov）
  cov-workspace        workspace 覆盖率，不含 xtask
  script-check [路径]  检查规则脚本，默认 scripts/

script-check 报告的问题：
  错误  语法错误、白名单以外的意图、rules.json 路由到不存在的脚本
  警告  无法识别的字符、被跳过的多余记号、永远不会被选中的分支
  提示  没有 ELSE REPLY 默认分支

同目录下有 rules.json 时使用其中的意图白名单，否则使用内置白名单。

别名：cargo check-all / cov-rules / cov-workspace / script-check
"#;

// ---------------------------------------------------------------------------
// script-check
// ---------------------------------------------------------------------------

const DEFAULT_SCRIPTS_DIR: &str = "scripts";
const CONFIG_FILE: &str = "rules.json";

/// 一次 script-check 的汇总
#[derive(Default)]
struct Findings {
    files: usize,
    unreadable: Vec<(PathBuf, std::io::Error)>,
    diagnostics: DiagnosticResult,
    /// 路由指向但目录中不存在的脚本名
    dangling_routes: Vec<String>,
}

impl Findings {
    fn errors(&self) -> usize {
        self.unreadable.len() + self.diagnostics.error_count() + self.dangling_routes.len()
    }
}

fn script_check(path: Option<&str>) -> anyhow::Result<()> {
    let target = PathBuf::from(path.unwrap_or(DEFAULT_SCRIPTS_DIR));
    let (dir, files) = resolve_target(&target, path.is_none())?;
    if files.is_empty() {
        eprintln!("{} 中没有 .dsl 文件", dir.display());
        return Ok(());
    }

    let config = load_dir_config(&dir)?;
    let parser = Parser::new(config.as_ref().map(|c| c.intents.clone()).unwrap_or_default());

    let mut findings = Findings {
        files: files.len(),
        ..Findings::default()
    };
    for file in files {
        match std::fs::read_to_string(&file) {
            Ok(text) => findings
                .diagnostics
                .merge(check_source(&file.display().to_string(), &text, &parser)),
            Err(err) => findings.unreadable.push((file, err)),
        }
    }
    if let Some(config) = &config {
        findings.dangling_routes = dangling_routes(config, &dir);
    }

    report(&findings);
    if findings.errors() > 0 {
        bail!("script-check 未通过");
    }
    Ok(())
}

/// 返回脚本所在目录与待检查的文件
fn resolve_target(target: &Path, is_default: bool) -> anyhow::Result<(PathBuf, Vec<PathBuf>)> {
    if target.is_file() {
        let dir = target.parent().map(Path::to_path_buf).unwrap_or_default();
        return Ok((dir, vec![target.to_path_buf()]));
    }
    if !target.is_dir() {
        if is_default {
            bail!("找不到 {}，请在仓库根目录运行或显式给出路径", target.display());
        }
        bail!("{} 不存在", target.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(target)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "dsl"))
        .collect();
    files.sort();
    Ok((target.to_path_buf(), files))
}

fn load_dir_config(dir: &Path) -> anyhow::Result<Option<RulesConfig>> {
    let path = dir.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let config =
        RulesConfig::load(&path).with_context(|| format!("{} 无法加载", path.display()))?;
    Ok(Some(config))
}

fn dangling_routes(config: &RulesConfig, dir: &Path) -> Vec<String> {
    let routes = &config.routes;
    let mut names: Vec<&String> = routes
        .by_intent
        .values()
        .chain(routes.by_category.values())
        .chain(routes.default_script.iter())
        .filter(|name| !dir.join(name.as_str()).is_file())
        .collect();
    names.sort();
    names.dedup();
    names.into_iter().cloned().collect()
}

fn report(findings: &Findings) {
    for (file, err) in &findings.unreadable {
        eprintln!("[ERROR] {}: 读取失败 ({})", file.display(), err);
    }
    for diag in &findings.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }
    for name in &findings.dangling_routes {
        eprintln!("[ERROR] {}: 路由目标 {} 不存在", CONFIG_FILE, name);
    }

    eprintln!(
        "\n{} 个脚本：{} 个错误，{} 个警告，{} 条提示",
        findings.files,
        findings.errors(),
        findings.diagnostics.warn_count(),
        findings.diagnostics.info_count(),
    );
}
