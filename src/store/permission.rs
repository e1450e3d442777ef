//! 启动前的数据库可用性检查
//!
//! ## 职责
//! - 确认 `chat.db` 存在、可读，且能执行查询
//! - 任一项失败时返回附带修复步骤的 `AppError::Configuration`
//!
//! ## 错误语义
//! - 该检查只在启动阶段执行，失败即终止，不进入轮询

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::AppError;

use super::open_read_only;

const FULL_DISK_ACCESS_STEPS: &str = "\
修复步骤：
  1. 打开「系统设置」
  2. 进入「隐私与安全性 → 完全磁盘访问权限」
  3. 点击锁图标并验证身份
  4. 添加运行本程序的终端应用：
     - Terminal: /Applications/Utilities/Terminal.app
     - iTerm2: /Applications/iTerm.app
  5. 打开对应开关
  6. 完全退出并重新启动终端
  7. 重新运行本程序";

/// 检查通过后的数据库概况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReport {
    pub path: PathBuf,
    pub message_count: i64,
}

/// 检查消息数据库是否可用
pub fn check_access(path: &Path) -> Result<StoreReport, AppError> {
    if !path.exists() {
        return Err(AppError::Configuration(format!(
            "未找到 Messages 数据库: {}\n请确认 Messages 应用至少打开过一次。",
            path.display()
        )));
    }
    log::info!("✅ 数据库文件存在: {}", path.display());

    if let Err(err) = File::open(path) {
        return Err(match err.kind() {
            ErrorKind::PermissionDenied => AppError::Configuration(format!(
                "没有 Messages 数据库的读取权限: {}\n{}",
                path.display(),
                FULL_DISK_ACCESS_STEPS
            )),
            _ => AppError::Configuration(format!(
                "无法读取 Messages 数据库 {}: {}",
                path.display(),
                err
            )),
        });
    }
    log::info!("✅ 已获得读取权限");

    let message_count = count_messages(path).map_err(|err| {
        AppError::Configuration(format!(
            "连接 Messages 数据库失败: {}\n可能的解决方法：\n  1. 退出 Messages 应用后重试\n  2. 为终端授予完全磁盘访问权限（见下）\n{}",
            err, FULL_DISK_ACCESS_STEPS
        ))
    })?;
    log::info!("✅ 数据库连接成功，共 {} 条消息", message_count);

    Ok(StoreReport {
        path: path.to_path_buf(),
        message_count,
    })
}

fn count_messages(path: &Path) -> Result<i64, AppError> {
    let conn = open_read_only(path)?;
    conn.query_row("SELECT COUNT(*) FROM message", [], |row| row.get(0))
        .map_err(|e| AppError::Store(format!("统计消息数失败: {}", e)))
}
