//! 应用程序入口 (Application Entrypoint)
//!
//! 负责 CLI 指令解析、日志初始化与依赖组装，结果以 JSON 输出到 stdout。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use bookhub::core::config::AppConfig;
use bookhub::engine::Aggregator;
use bookhub::network::ServiceContext;

/// 命令行界面脚手架 (CLI Scaffolding)
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 配置文件路径，默认读取工作目录下的 config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 启动时预先导入的书源 (JSON 文本或 HTTP(S) 地址)，可重复
    #[arg(long = "import", global = true)]
    imports: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出全部书源
    Sources,
    /// 搜索书籍
    Search {
        keyword: String,
        /// 只查询指定书源
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// 书籍详情
    Detail { source: String, book: String },
    /// 章节目录
    Chapters { source: String, book: String },
    /// 章节正文
    Content {
        source: String,
        book: String,
        chapter: String,
    },
    /// 导入 Legado 书源
    Import { input: String },
    /// 列出已导入书源
    Imported,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 未设置 RUST_LOG 时默认 info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => AppConfig::load()?,
    };
    let ctx = ServiceContext::new(Arc::new(config))?;
    let aggregator = Aggregator::from_context(&ctx)?;

    for input in &cli.imports {
        match aggregator.import_sources(input).await {
            Ok(summary) => info!("预加载书源: 成功 {}, 失败 {}", summary.success, summary.failed),
            Err(e) => warn!("预加载书源失败: {}", e),
        }
    }

    match cli.command {
        Commands::Sources => print_json(&aggregator.list_sources()),
        Commands::Search {
            keyword,
            source,
            page,
        } => print_json(&aggregator.search(&keyword, source.as_deref(), page).await?),
        Commands::Detail { source, book } => {
            print_json(&aggregator.book_detail(&source, &book).await?)
        }
        Commands::Chapters { source, book } => {
            print_json(&aggregator.chapter_list(&source, &book).await?)
        }
        Commands::Content {
            source,
            book,
            chapter,
        } => print_json(&aggregator.chapter_content(&source, &book, &chapter).await?),
        Commands::Import { input } => print_json(&aggregator.import_sources(&input).await?),
        Commands::Imported => print_json(&aggregator.list_imported()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
