//! # Reply Rules CLI
//!
//! 规则脚本的命令行工具：查看记号、检查脚本、在给定上下文上求值，
//! 以及按配置路由一条意图分类记录。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p rules-cli -- tokens scripts/price_query.dsl
//! cargo run -p rules-cli -- check scripts/price_query.dsl scripts/stock_query.dsl
//! cargo run -p rules-cli -- run scripts/price_query.dsl --context '{"品牌": "小米", "型号": "14"}'
//! cargo run -p rules-cli -- respond -c scripts/rules.json --record '{"category": "手机", "intent": "价格查询", "params": {}}'
//! ```
//!
//! 日志输出到 stderr，级别由 `RUST_LOG` 控制，`-v` 打开 debug 日志。

mod script_dir;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Parser as CliParser, Subcommand};
use reply_rules::{
    Context, DiagnosticLevel, IntentRecord, Parser, RuleEngine, RulesConfig, check_source,
    evaluate, tokenize,
};

use tracing_subscriber::EnvFilter;

use script_dir::ScriptDir;

#[derive(CliParser)]
#[command(name = "reply-rules")]
#[command(about = "导购对话规则脚本工具")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（意图白名单、兜底回复、路由）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 输出 debug 日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出脚本的记号
    Tokens {
        /// 脚本文件
        file: PathBuf,
    },

    /// 检查脚本并输出诊断
    Check {
        /// 脚本文件
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// 在给定上下文上对脚本求值
    Run {
        /// 脚本文件
        file: PathBuf,

        /// 上下文（JSON 对象）
        #[arg(long, default_value = "{}")]
        context: String,
    },

    /// 按路由选择脚本并应答一条意图分类记录
    Respond {
        /// 脚本目录（默认：scripts）
        #[arg(long, default_value = "scripts")]
        scripts: PathBuf,

        /// 意图分类记录（JSON 对象）
        #[arg(long)]
        record: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Tokens { file } => print_tokens(&file),
        Commands::Check { files } => check_files(&files, &load_config(config_path)?),
        Commands::Run { file, context } => {
            run_script(&file, &context, &load_config(config_path)?)
        }
        Commands::Respond { scripts, record } => respond(&scripts, &record, config_path),
    }
}

/// `-v` 固定为 debug；否则使用 `RUST_LOG`，未设置时为 warn
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RulesConfig> {
    match path {
        Some(path) => RulesConfig::load(path)
            .with_context(|| format!("无法加载配置 {}", path.display())),
        None => Ok(RulesConfig::default()),
    }
}

fn read_script(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("无法读取脚本 {}", path.display()))
}

fn print_tokens(path: &Path) -> Result<()> {
    let text = read_script(path)?;
    let lexed = tokenize(&text);

    for token in &lexed.tokens {
        println!(
            "{:>6}  {:<12} {}",
            token.span.to_string(),
            format!("{:?}", token.category()),
            token.kind
        );
    }
    for err in &lexed.errors {
        eprintln!("⚠️ {}", err);
    }
    Ok(())
}

fn check_files(files: &[PathBuf], config: &RulesConfig) -> Result<()> {
    let parser = Parser::new(config.intents.clone());
    let mut errors = 0;
    let mut warnings = 0;

    for path in files {
        let text = read_script(path)?;
        let result = check_source(&path.display().to_string(), &text, &parser);
        for diag in result.filter_by_level(DiagnosticLevel::Info) {
            println!("{}", diag);
        }
        errors += result.error_count();
        warnings += result.warn_count();
    }

    println!();
    if errors > 0 {
        bail!("检查失败：{} 个错误，{} 个警告", errors, warnings);
    }
    println!("✅ 检查通过：{} 个文件，{} 个警告", files.len(), warnings);
    Ok(())
}

fn run_script(path: &Path, context: &str, config: &RulesConfig) -> Result<()> {
    let text = read_script(path)?;
    let context = Context::from_json_str(context).context("上下文必须是 JSON 对象")?;

    let report = Parser::new(config.intents.clone()).parse(&text);
    for err in &report.lex_errors {
        eprintln!("⚠️ {}", err);
    }
    let script = report
        .into_result()
        .with_context(|| format!("脚本不可用 {}", path.display()))?;

    let outcome = evaluate(&script, &context)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn respond(scripts: &Path, record: &str, config: Option<&Path>) -> Result<()> {
    let record: IntentRecord = serde_json::from_str(record).context("无法解析意图分类记录")?;

    let source = ScriptDir::new(scripts);
    let mut engine = match config {
        Some(path) => RuleEngine::from_config_file(path, source)
            .with_context(|| format!("无法加载配置 {}", path.display()))?,
        None => RuleEngine::new(RulesConfig::default(), source),
    };
    let response = engine.respond_to_record(&record);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
