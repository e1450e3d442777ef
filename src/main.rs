//! # 短信验证码监控 — 程序入口
//!
//! 本文件仅负责参数解析、配置合并、启动检查与组装轮询调度器。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sms_code_monitor::config::{self, MonitorConfig};
use sms_code_monitor::monitor::runner::{Runner, RunnerOptions};
use sms_code_monitor::monitor::sink::{
    ArboardClipboard, ClipboardWriter, DisabledClipboard, LogNotifier, Notifier, OsascriptNotifier,
};
use sms_code_monitor::monitor::MonitorSession;
use sms_code_monitor::store::{permission, ChatStore};

#[derive(Parser)]
#[command(name = "sms-code-monitor", version, about = "监控 Messages 中的短信验证码并自动复制到剪贴板")]
struct Cli {
    /// 配置文件路径 [默认: ~/.config/sms-code-monitor/config.json]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Messages 数据库路径 [默认: ~/Library/Messages/chat.db]
    #[arg(long)]
    db: Option<PathBuf>,

    /// 轮询间隔（毫秒）
    #[arg(long)]
    interval_ms: Option<u64>,

    /// 不发送系统通知
    #[arg(long)]
    no_notify: bool,

    /// 不写入剪贴板
    #[arg(long)]
    no_clipboard: bool,

    /// 将每个新验证码以 JSON 行输出到标准输出
    #[arg(long)]
    json: bool,

    /// 忽略启动前已存在的消息
    #[arg(long)]
    skip_existing: bool,

    /// 只执行数据库权限检查后退出
    #[arg(long)]
    check: bool,

    /// 将合并后的配置写入指定路径后退出
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, mut config: MonitorConfig) -> MonitorConfig {
        if let Some(ref db) = self.db {
            config.db_path = Some(db.clone());
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poll_interval_ms = interval_ms;
        }
        if self.no_notify {
            config.notifications = false;
        }
        if self.no_clipboard {
            config.copy_to_clipboard = false;
        }
        config.normalized()
    }
}

fn build_notifier(config: &MonitorConfig) -> Box<dyn Notifier> {
    if config.notifications && cfg!(target_os = "macos") {
        Box::new(OsascriptNotifier)
    } else {
        Box::new(LogNotifier)
    }
}

fn build_clipboard(config: &MonitorConfig) -> Box<dyn ClipboardWriter> {
    if config.copy_to_clipboard {
        Box::new(ArboardClipboard::new())
    } else {
        Box::new(DisabledClipboard)
    }
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("注册 Ctrl+C 信号失败，只能通过结束进程停止: {err}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = cli.apply_overrides(config::load_config(cli.config.as_deref()));

    if let Some(ref path) = cli.write_config {
        return match config::save_config_to_path(path, &config) {
            Ok(()) => {
                log::info!("配置已写入: {}", path.display());
                ExitCode::SUCCESS
            }
            Err(err) => {
                log::error!("写入配置失败: {err}");
                ExitCode::FAILURE
            }
        };
    }

    log::info!("=== 2FA 监控启动 ===");
    log::info!("当前时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

    let db_path = match config.resolve_db_path() {
        Ok(path) => path,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    log::info!("数据库路径: {}", db_path.display());

    log::info!("--- 权限检查 ---");
    if let Err(err) = permission::check_access(&db_path) {
        log::error!("❌ {err}");
        return ExitCode::FAILURE;
    }
    log::info!("--- 权限检查完成 ---");
    if cli.check {
        return ExitCode::SUCCESS;
    }

    let store = ChatStore::new(db_path).with_batch_limit(config.batch_limit);
    let mut session = MonitorSession::with_capacity(config.history_capacity);
    if cli.skip_existing {
        match store.max_message_id() {
            Ok(max_id) => {
                log::info!("跳过启动前已存在的消息（水位线 {max_id}）");
                session = session.with_watermark(max_id);
            }
            Err(err) => log::warn!("⚠️ 读取当前最大消息 ID 失败，将从头处理: {err}"),
        }
    }

    let runner = Runner::new(
        store,
        session,
        build_clipboard(&config),
        build_notifier(&config),
        RunnerOptions {
            poll_interval: config.poll_interval(),
            notification_sound: config.notification_sound,
            json_output: cli.json,
        },
    );

    runner.run(wait_for_ctrl_c()).await;
    ExitCode::SUCCESS
}
