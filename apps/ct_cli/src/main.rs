// apps/ct_cli/src/main.rs

//! CardioTherm 命令行界面
//!
//! 在长方体演示网格上驱动稳定性控制与边界通量层。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**：
//! - 配置一律通过 `CaseConfig` 读取
//! - 多分区行为用进程内通信组模拟

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// CardioTherm 稳定性控制命令行工具
#[derive(Parser)]
#[command(name = "ct_cli")]
#[command(author = "CardioTherm Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CardioTherm stability control and flux boundary driver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行演示算例
    Run(commands::run::RunArgs),
    /// 验证配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
