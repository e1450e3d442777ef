//! Messages 数据库读取模块
//!
//! # 设计思路
//!
//! 监控器只读访问 macOS Messages 的 `chat.db`，不写入、不持久化任何自身状态。
//! 每轮轮询单独打开只读连接并在查询后立即关闭，避免长时间占用数据库。
//!
//! # 实现思路
//!
//! - 查询仅返回收到的消息（`is_from_me = 0`），按时间倒序，限制条数。
//! - 同时读取 `text` 与 `attributedBody`，由识别流水线决定使用哪一列。
//! - 对外通过 `MessageSource` trait 暴露，测试可使用内存替身。

pub mod permission;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};

use crate::error::AppError;
use crate::monitor::RawMessage;

/// 默认单次查询条数
pub const DEFAULT_BATCH_LIMIT: u32 = 20;

const RECENT_INBOUND_MESSAGES_SQL: &str = "
    SELECT
        message.ROWID,
        message.text,
        message.attributedBody,
        message.date,
        chat.ROWID AS chat_id,
        chat.chat_identifier
    FROM message
    JOIN chat_message_join ON message.ROWID = chat_message_join.message_id
    JOIN chat ON chat_message_join.chat_id = chat.ROWID
    WHERE message.ROWID > ?1
        AND message.is_from_me = 0
    ORDER BY message.date DESC
    LIMIT ?2
";

/// 消息来源：每次调用返回水位线之后的一批消息
pub trait MessageSource {
    fn fetch_since(&mut self, watermark: i64) -> Result<Vec<RawMessage>, AppError>;
}

/// `chat.db` 只读访问
#[derive(Debug, Clone)]
pub struct ChatStore {
    path: PathBuf,
    batch_limit: u32,
}

impl ChatStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }

    pub fn with_batch_limit(mut self, batch_limit: u32) -> Self {
        self.batch_limit = batch_limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, AppError> {
        open_read_only(&self.path)
    }

    /// 当前库中收到消息的最大 ROWID，库为空时返回 0
    pub fn max_message_id(&self) -> Result<i64, AppError> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT COALESCE(MAX(ROWID), 0) FROM message WHERE is_from_me = 0",
            [],
            |row| row.get(0),
        )
        .map_err(|e| AppError::Store(format!("查询最大消息 ID 失败: {}", e)))
    }

    /// 查询水位线之后最近收到的消息
    pub fn recent_messages(&self, watermark: i64) -> Result<Vec<RawMessage>, AppError> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(RECENT_INBOUND_MESSAGES_SQL)
            .map_err(|e| AppError::Store(format!("准备消息查询失败: {}", e)))?;

        let messages = stmt
            .query_map(params![watermark, self.batch_limit], |row| {
                Ok(RawMessage {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    attributed_body: row.get(2)?,
                    date: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
                    chat_id: row.get(4)?,
                    chat_identifier: row.get(5)?,
                })
            })
            .map_err(|e| AppError::Store(format!("查询消息失败: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Store(format!("读取消息行失败: {}", e)))?;

        Ok(messages)
    }
}

impl MessageSource for ChatStore {
    fn fetch_since(&mut self, watermark: i64) -> Result<Vec<RawMessage>, AppError> {
        self.recent_messages(watermark)
    }
}

pub(crate) fn open_read_only(path: &Path) -> Result<Connection, AppError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| AppError::Store(format!("打开消息数据库失败: {}", e)))
}
