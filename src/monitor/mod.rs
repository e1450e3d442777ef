//! 消息游标与识别流水线
//!
//! # 设计思路
//!
//! `MonitorSession` 是监控器唯一的可变状态：
//! - **水位线**：已处理过的最大消息 ID，单调不减，保证每条消息最多处理一次
//! - **去重历史**：最近发出的验证码
//!
//! 外部轮询器每次交给会话一批消息，批次之间允许重叠、顺序不定；
//! 是否处理只看水位线，不看批次成员关系。
//!
//! # 实现思路
//!
//! - 状态作为会话字段持有，不使用全局变量，便于多实例与确定性测试。
//! - `process_batch` 不做 I/O，只返回 `EmittedCode` 事件；剪贴板与通知由 `runner` 派发。
//! - 每条消息在处理下一条之前完整走完 还原 → 提取 → 去重，不存在半处理状态。

pub mod runner;
pub mod sink;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::detect::{extract_code, resolve_text, DedupHistory, PatternClass};

/// Messages 库时间戳的纪元（2001-01-01T00:00:00Z）相对 Unix 纪元的秒数
const APPLE_EPOCH_OFFSET_SECS: i64 = 978_307_200;
/// 超过该值的时间戳按纳秒解释（新版 macOS），否则按秒解释
const NANOSECOND_DATE_THRESHOLD: i64 = 100_000_000_000;

/// 从消息库读出的一条原始消息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// 消息 ROWID，在库的生命周期内唯一且递增
    pub id: i64,
    /// 纯文本正文
    pub text: Option<String>,
    /// 富文本归档载荷（`attributedBody`）
    pub attributed_body: Option<Vec<u8>>,
    /// 原始时间戳（Apple 纪元）
    pub date: i64,
    /// 会话 ROWID
    pub chat_id: i64,
    /// 会话标识（手机号 / 邮箱 / 短号）
    pub chat_identifier: Option<String>,
}

impl RawMessage {
    /// 将 Apple 纪元时间戳转换为 UTC 时间
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        if self.date == 0 {
            return None;
        }
        let (secs, nanos) = if self.date.abs() >= NANOSECOND_DATE_THRESHOLD {
            (
                self.date.div_euclid(1_000_000_000),
                self.date.rem_euclid(1_000_000_000) as u32,
            )
        } else {
            (self.date, 0)
        };
        DateTime::<Utc>::from_timestamp(secs.checked_add(APPLE_EPOCH_OFFSET_SECS)?, nanos)
    }
}

/// 一次新验证码事件，监控核心的唯一输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedCode {
    pub code: String,
    pub pattern: PatternClass,
    pub message_id: i64,
    pub chat_id: i64,
    pub chat_identifier: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

/// 监控会话：水位线 + 去重历史
#[derive(Debug, Clone, Default)]
pub struct MonitorSession {
    watermark: i64,
    history: DedupHistory,
    emitted_total: u64,
}

impl MonitorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定去重窗口大小创建会话
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: DedupHistory::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// 从指定水位线开始（用于跳过启动前已存在的消息）
    pub fn with_watermark(mut self, watermark: i64) -> Self {
        self.watermark = self.watermark.max(watermark);
        self
    }

    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    pub fn history(&self) -> &DedupHistory {
        &self.history
    }

    /// 本次会话累计发出的验证码数量
    pub fn emitted_total(&self) -> u64 {
        self.emitted_total
    }

    /// 处理一批消息，返回按迭代顺序产生的新验证码事件
    ///
    /// 批次顺序不影响结果（水位线取最大值），ID 不大于水位线的消息被跳过。
    pub fn process_batch(&mut self, messages: &[RawMessage]) -> Vec<EmittedCode> {
        let mut emitted = Vec::new();
        for message in messages {
            if message.id <= self.watermark {
                log::trace!("⏭️  跳过已处理消息 ID {}", message.id);
                continue;
            }
            self.watermark = message.id;
            if let Some(event) = self.process_message(message) {
                emitted.push(event);
            }
        }
        emitted
    }

    fn process_message(&mut self, message: &RawMessage) -> Option<EmittedCode> {
        log::debug!(
            ">>> 处理消息 ID {}（会话 {}）",
            message.id,
            message.chat_identifier.as_deref().unwrap_or("未知")
        );

        let Some(text) = resolve_text(message.text.as_deref(), message.attributed_body.as_deref())
        else {
            log::debug!("消息 ID {} 无可用文本，跳过", message.id);
            return None;
        };
        log::debug!("文本预览: {}", preview(&text));

        let Some(candidate) = extract_code(&text) else {
            log::debug!("消息 ID {} 未发现验证码", message.id);
            return None;
        };

        if !self.history.consider_code(&candidate.value).is_new {
            log::info!("🔁 验证码 {} 已处理过，跳过", candidate.value);
            return None;
        }
        self.history.record_emitted(&candidate.value);
        self.emitted_total += 1;
        log::info!(
            "✅ 新验证码 {}（{}，消息 ID {}），去重窗口 {}/{}",
            candidate.value,
            candidate.pattern,
            message.id,
            self.history.len(),
            self.history.capacity()
        );

        Some(EmittedCode {
            code: candidate.value,
            pattern: candidate.pattern,
            message_id: message.id,
            chat_id: message.chat_id,
            chat_identifier: message.chat_identifier.clone(),
            received_at: message.received_at(),
        })
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(100).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message(id: i64, text: &str) -> RawMessage {
        RawMessage {
            id,
            text: Some(text.to_string()),
            ..RawMessage::default()
        }
    }

    #[test]
    fn new_code_is_emitted_once() {
        let mut session = MonitorSession::new();
        let events = session.process_batch(&[text_message(1, "Your code is 482913, expires in 10 min")]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].code, "482913");
        assert_eq!(events[0].pattern, PatternClass::SixDigit);
        assert_eq!(events[0].message_id, 1);

        let again = session.process_batch(&[text_message(2, "Reminder: 482913")]);
        assert!(again.is_empty());
        assert_eq!(session.watermark(), 2);
        assert_eq!(session.emitted_total(), 1);
    }

    #[test]
    fn short_payload_only_message_emits_nothing_but_advances_watermark() {
        let mut session = MonitorSession::new();
        let message = RawMessage {
            id: 7,
            attributed_body: Some(b"hi".to_vec()),
            ..RawMessage::default()
        };
        assert!(session.process_batch(&[message]).is_empty());
        assert_eq!(session.watermark(), 7);
        assert!(session.history().is_empty());
    }

    #[test]
    fn batch_order_does_not_change_final_watermark() {
        let mut session = MonitorSession::new().with_watermark(4);
        let batch = [
            text_message(5, "code 1111"),
            text_message(3, "code 3333"),
            text_message(8, "code 8888"),
        ];
        let events = session.process_batch(&batch);
        let codes: Vec<_> = events.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["1111", "8888"]);
        assert_eq!(session.watermark(), 8);
    }

    #[test]
    fn descending_batch_processes_only_the_newest() {
        // 消息库按时间倒序返回：先处理 ID 8 后，ID 5 已不大于水位线
        let mut session = MonitorSession::new().with_watermark(4);
        let batch = [text_message(8, "code 8888"), text_message(5, "code 5555")];
        let events = session.process_batch(&batch);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].code, "8888");
        assert_eq!(session.watermark(), 8);
    }

    #[test]
    fn overlapping_batches_are_not_reprocessed() {
        let mut session = MonitorSession::new();
        assert_eq!(session.process_batch(&[text_message(1, "code 1234")]).len(), 1);
        assert!(session.process_batch(&[text_message(1, "code 1234")]).is_empty());
        assert_eq!(session.emitted_total(), 1);
    }

    #[test]
    fn with_watermark_never_lowers() {
        let session = MonitorSession::new().with_watermark(10).with_watermark(3);
        assert_eq!(session.watermark(), 10);
    }

    #[test]
    fn received_at_handles_nanosecond_and_second_dates() {
        let nanos = RawMessage {
            date: 700_000_000_000_000_000,
            ..RawMessage::default()
        };
        let secs = RawMessage {
            date: 700_000_000,
            ..RawMessage::default()
        };
        let expected = DateTime::<Utc>::from_timestamp(700_000_000 + APPLE_EPOCH_OFFSET_SECS, 0);
        assert_eq!(nanos.received_at(), expected);
        assert_eq!(secs.received_at(), expected);
        assert_eq!(RawMessage::default().received_at(), None);
    }

    #[test]
    fn preview_truncates_long_text() {
        let long = "a".repeat(150);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), 103);
        assert!(shown.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
