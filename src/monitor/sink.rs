//! 剪贴板与系统通知的能力接口
//!
//! # 设计思路
//!
//! 监控核心只依赖两个单方法 trait，具体实现可替换：
//! - 生产环境：`ArboardClipboard` 写系统剪贴板，`OsascriptNotifier` 发 macOS 通知
//! - 其他平台或关闭通知时：`LogNotifier` 只写日志
//! - 测试：记录调用的替身实现，无需触碰真实系统设施
//!
//! 两者均为"尽力而为"：失败只记录日志，不中断轮询。

use std::process::Command;

use crate::error::AppError;

/// 剪贴板写入能力
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<(), AppError>;

    /// 关闭复制时返回 `false`，调用方据此不再声称验证码已复制
    fn is_enabled(&self) -> bool {
        true
    }
}

/// 用户通知能力
pub trait Notifier {
    fn notify(&mut self, title: &str, message: &str, sound: bool) -> Result<(), AppError>;
}

/// 基于 `arboard` 的系统剪贴板
///
/// 句柄延迟创建并在进程内保持存活：Linux/X11 下剪贴板内容归属于持有句柄的进程，
/// 句柄被释放后内容可能丢失。
#[derive(Default)]
pub struct ArboardClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ArboardClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardWriter for ArboardClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), AppError> {
        if self.inner.is_none() {
            let created = arboard::Clipboard::new()
                .map_err(|e| AppError::Clipboard(format!("初始化剪贴板失败: {}", e)))?;
            self.inner = Some(created);
        }
        let Some(clipboard) = self.inner.as_mut() else {
            return Err(AppError::Clipboard("剪贴板句柄不可用".into()));
        };
        if let Err(err) = clipboard.set_text(text.to_owned()) {
            // 句柄可能已失效，下次写入时重新创建
            self.inner = None;
            return Err(AppError::Clipboard(err.to_string()));
        }
        log::info!("📋 已复制到剪贴板: {}", text);
        Ok(())
    }
}

/// 关闭剪贴板写入时使用
#[derive(Debug, Default)]
pub struct DisabledClipboard;

impl ClipboardWriter for DisabledClipboard {
    fn is_enabled(&self) -> bool {
        false
    }

    fn write_text(&mut self, text: &str) -> Result<(), AppError> {
        log::debug!("剪贴板写入已关闭，忽略验证码 {}", text);
        Ok(())
    }
}

/// 通过 `osascript` 发送 macOS 通知
#[derive(Debug, Default)]
pub struct OsascriptNotifier;

impl Notifier for OsascriptNotifier {
    fn notify(&mut self, title: &str, message: &str, sound: bool) -> Result<(), AppError> {
        let script = build_notification_script(title, message, sound);
        let output = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output()
            .map_err(|e| AppError::Notify(format!("启动 osascript 失败: {}", e)))?;
        if !output.status.success() {
            return Err(AppError::Notify(format!(
                "osascript 退出码 {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        log::info!("🔔 通知: {} - {}", title, message);
        Ok(())
    }
}

/// 只写日志的通知实现
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, title: &str, message: &str, _sound: bool) -> Result<(), AppError> {
        log::info!("🔔 {} - {}", title, message);
        Ok(())
    }
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn build_notification_script(title: &str, message: &str, sound: bool) -> String {
    let sound_part = if sound { " sound name \"Glass\"" } else { "" };
    format!(
        "display notification \"{}\" with title \"{}\"{}",
        escape_applescript(message),
        escape_applescript(title),
        sound_part
    )
}
