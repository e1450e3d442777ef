//! 运行配置模块
//!
//! # 设计思路
//!
//! 将轮询间隔、批量大小、去重窗口与副作用开关集中到 `MonitorConfig`。
//! 配置文件为 JSON（camelCase 键），缺失或无法解析时回退到默认值，
//! 保证监控器总能以可用配置启动。
//!
//! # 实现思路
//!
//! - 读取顺序：`--config` 指定路径 → `$HOME/.config/sms-code-monitor/config.json`。
//! - 数值字段在 `normalized()` 中钳制到安全区间，避免 0 间隔空转等误配置。
//! - 命令行参数在 `main.rs` 中覆盖文件值。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detect::dedup::DEFAULT_HISTORY_CAPACITY;
use crate::error::AppError;
use crate::store::DEFAULT_BATCH_LIMIT;

const POLL_INTERVAL_DEFAULT_MS: u64 = 2_000;
const POLL_INTERVAL_MIN_MS: u64 = 200;
const POLL_INTERVAL_MAX_MS: u64 = 60_000;
const BATCH_LIMIT_MIN: u32 = 1;
const BATCH_LIMIT_MAX: u32 = 500;
const HISTORY_CAPACITY_MIN: usize = 1;
const HISTORY_CAPACITY_MAX: usize = 1_000;

/// 监控器运行配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Messages 数据库路径；为空时使用 `~/Library/Messages/chat.db`
    pub db_path: Option<PathBuf>,
    /// 两次轮询之间的间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 单次查询返回的最大消息条数
    pub batch_limit: u32,
    /// 去重窗口大小
    pub history_capacity: usize,
    /// 是否发送系统通知
    pub notifications: bool,
    /// 识别到验证码时通知是否带提示音
    pub notification_sound: bool,
    /// 是否把新验证码写入剪贴板
    pub copy_to_clipboard: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            poll_interval_ms: POLL_INTERVAL_DEFAULT_MS,
            batch_limit: DEFAULT_BATCH_LIMIT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            notifications: true,
            notification_sound: true,
            copy_to_clipboard: true,
        }
    }
}

impl MonitorConfig {
    /// 返回钳制后的配置副本
    pub fn normalized(mut self) -> Self {
        self.poll_interval_ms = self
            .poll_interval_ms
            .clamp(POLL_INTERVAL_MIN_MS, POLL_INTERVAL_MAX_MS);
        self.batch_limit = self.batch_limit.clamp(BATCH_LIMIT_MIN, BATCH_LIMIT_MAX);
        self.history_capacity = self
            .history_capacity
            .clamp(HISTORY_CAPACITY_MIN, HISTORY_CAPACITY_MAX);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 解析最终使用的数据库路径
    pub fn resolve_db_path(&self) -> Result<PathBuf, AppError> {
        if let Some(ref path) = self.db_path {
            if !path.as_os_str().is_empty() {
                return Ok(path.clone());
            }
        }
        Ok(home_dir()?.join("Library").join("Messages").join("chat.db"))
    }
}

fn home_dir() -> Result<PathBuf, AppError> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| AppError::Configuration("无法确定用户主目录：未设置 HOME 环境变量".into()))
}

/// 默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    home_dir()
        .ok()
        .map(|home| home.join(".config").join("sms-code-monitor").join("config.json"))
}

/// 从指定路径读取配置，文件缺失或格式错误时回退到默认值
pub fn load_config_from_path(config_path: &Path) -> MonitorConfig {
    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(content) => match serde_json::from_str::<MonitorConfig>(&content) {
                Ok(config) => return config.normalized(),
                Err(err) => {
                    log::warn!("配置文件解析失败，使用默认配置: {} ({})", config_path.display(), err);
                }
            },
            Err(err) => {
                log::warn!("读取配置文件失败，使用默认配置: {} ({})", config_path.display(), err);
            }
        }
    }
    MonitorConfig::default()
}

/// 读取配置：优先使用显式路径，否则使用默认路径
pub fn load_config(explicit: Option<&Path>) -> MonitorConfig {
    match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => load_config_from_path(&path),
        None => MonitorConfig::default(),
    }
}

/// 将配置写入指定路径（用于生成模板配置）
pub fn save_config_to_path(config_path: &Path, config: &MonitorConfig) -> Result<(), AppError> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Configuration(format!("序列化配置失败: {}", e)))?;
    fs::write(config_path, content)?;
    Ok(())
}
