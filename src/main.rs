use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cloudpush::{config, logging};
use cloudpush::models::ItemEntry;
use cloudpush::storage::{DriverContext, Service};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")");

/// Push files to cloud storage services / 推送文件到云存储服务
#[derive(Parser)]
#[command(name = "cloudpush", version, long_version = LONG_VERSION)]
struct Cli {
    /// Config file path / 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Push files to every configured agent / 推送文件到所有代理
    Push {
        /// Local paths, `s3:` keys or http(s) URLs, optionally `SOURCE=REMOTE_PATH`
        #[arg(required = true)]
        sources: Vec<String>,
    },
    /// List remote directories of every configured agent / 列出远程目录
    List {
        path: Option<String>,
    },
    /// Show supported services / 显示支持的服务
    Services,
}

/// `SOURCE=REMOTE_PATH` maps a source to an explicit remote path / 解析来源映射
fn parse_entry(arg: &str) -> ItemEntry {
    match arg.split_once('=') {
        Some((source, path)) if !source.is_empty() && !path.is_empty() => ItemEntry::Mapped {
            source: source.to_string(),
            path: path.to_string(),
        },
        _ => ItemEntry::from(arg),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging before anything can log / 初始化日志
    let log_filter = logging::init();

    // Load configuration / 加载配置
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let app_config = config::load_config(&config_path)?;
    logging::apply_silent(&log_filter, app_config.silent)?;

    if let Command::Services = cli.command {
        for service in Service::ALL {
            println!("{}\t{}\t{}", service.id(), service, service.display_name());
        }
        return Ok(());
    }

    let ctx = DriverContext {
        stream: app_config.stream.clone(),
        http: app_config.http.clone(),
        sources: app_config.sources.clone(),
    };
    let registry = cloudpush::registry_with_drivers(ctx).await;
    for agent in &app_config.agents {
        registry.create(agent.service, &agent.token, agent.options.clone()).await?;
    }
    tracing::debug!("Active agents:\n{}", registry.summary().await);

    match cli.command {
        Command::Push { sources } => {
            let entries: Vec<ItemEntry> = sources.iter().map(|s| parse_entry(s)).collect();
            let outcomes = registry.push(&entries).await?;
            for outcome in outcomes {
                match outcome.revision {
                    Some(revision) => println!("pushed {} items ({})", outcome.items, revision),
                    None => println!("pushed {} items", outcome.items),
                }
            }
        }
        Command::List { path } => {
            for agent in registry.agents().await {
                println!("[{}] {}", agent.name(), agent.dir());
                for folder in agent.folders(path.as_deref()).await? {
                    println!("  {}/", folder.name);
                }
                for file in agent.files(path.as_deref()).await? {
                    println!("  {}", file.name);
                }
            }
        }
        Command::Services => {}
    }

    Ok(())
}
