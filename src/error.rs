//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，覆盖消息库读取、剪贴板写入、
//! 系统通知与启动前置检查四类失败来源。
//!
//! 按照错误分级处理：
//! - `Store` / `Clipboard` / `Notify`：可恢复的 I/O 失败，记录日志后继续下一轮轮询。
//! - `Configuration`：启动前置条件不满足（数据库缺失、无读权限），致命，
//!   消息中附带可操作的修复说明。
//!
//! 载荷无法解码为文本不属于错误，由 `normalize_payload` 返回 `None` 表达。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `std::io::Error` 提供 `From` 转换，无需手动 map。

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 消息数据库查询失败（可恢复）
    #[error("消息数据库错误: {0}")]
    Store(String),

    /// 剪贴板写入失败（可恢复）
    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    /// 系统通知发送失败（可恢复）
    #[error("系统通知失败: {0}")]
    Notify(String),

    /// 启动前置条件不满足（致命）
    #[error("{0}")]
    Configuration(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// 是否只能在启动阶段终止进程，而不是在下一轮轮询时重试
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Configuration(_))
    }
}
