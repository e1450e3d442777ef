//! 轮询调度
//!
//! # 设计思路
//!
//! 监控核心只暴露"处理一批消息"，定时与停止由这里负责：
//! - 固定间隔轮询消息来源（默认 2 秒），首轮立即执行
//! - 收到停止信号后在两轮之间退出，会话状态无需清理
//! - 新验证码依次派发到剪贴板与通知，失败只记录日志
//!
//! # 实现思路
//!
//! - `tokio::time::interval` + `tokio::select!`（`biased`，停止信号优先）。
//! - 停止信号是任意 `Future`，生产环境为 `ctrl_c()`，测试中为 oneshot 通道。
//! - 轮询本身是同步调用：查询很短，且整个核心按单线程顺序执行。

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::store::MessageSource;

use super::sink::{ClipboardWriter, Notifier};
use super::{EmittedCode, MonitorSession};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// 调度参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    pub poll_interval: Duration,
    /// 识别到验证码时通知是否带提示音
    pub notification_sound: bool,
    /// 是否把事件以 JSON 行输出到标准输出
    pub json_output: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            notification_sound: true,
            json_output: false,
        }
    }
}

/// 一次运行的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub codes_emitted: u64,
    pub watermark: i64,
}

fn notification_message(copied: bool, code: &str) -> String {
    if copied {
        format!("Code copied to clipboard: {code}")
    } else {
        format!("Code detected: {code}")
    }
}

/// 轮询调度器
pub struct Runner<S: MessageSource> {
    source: S,
    session: MonitorSession,
    clipboard: Box<dyn ClipboardWriter>,
    notifier: Box<dyn Notifier>,
    options: RunnerOptions,
}

impl<S: MessageSource> Runner<S> {
    pub fn new(
        source: S,
        session: MonitorSession,
        clipboard: Box<dyn ClipboardWriter>,
        notifier: Box<dyn Notifier>,
        options: RunnerOptions,
    ) -> Self {
        Self {
            source,
            session,
            clipboard,
            notifier,
            options,
        }
    }

    pub fn session(&self) -> &MonitorSession {
        &self.session
    }

    /// 执行一轮：拉取 → 识别 → 派发
    ///
    /// 拉取失败视为可恢复错误，记录日志后返回空结果。
    pub fn poll_once(&mut self) -> Vec<EmittedCode> {
        log::trace!("--- 检查新消息（水位线 {}）---", self.session.watermark());
        let messages = match self.source.fetch_since(self.session.watermark()) {
            Ok(messages) => messages,
            Err(err) => {
                log::warn!("⚠️ 拉取消息失败，下一轮重试: {}", err);
                return Vec::new();
            }
        };
        if messages.is_empty() {
            log::trace!("没有新消息");
            return Vec::new();
        }
        log::debug!("本轮拉取到 {} 条消息", messages.len());

        let events = self.session.process_batch(&messages);
        for event in &events {
            self.dispatch(event);
        }
        events
    }

    fn dispatch(&mut self, event: &EmittedCode) {
        let message = notification_message(self.copy_to_clipboard(&event.code), &event.code);
        self.send_notification("2FA Code Detected ✓", &message, self.options.notification_sound);
        if self.options.json_output {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(err) => log::warn!("⚠️ 序列化验证码事件失败: {}", err),
            }
        }
    }

    /// 写入剪贴板，返回验证码是否确实已在剪贴板中
    fn copy_to_clipboard(&mut self, code: &str) -> bool {
        if !self.clipboard.is_enabled() {
            return false;
        }
        match self.clipboard.write_text(code) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("⚠️ 复制验证码到剪贴板失败: {}", err);
                false
            }
        }
    }

    fn send_notification(&mut self, title: &str, message: &str, sound: bool) {
        if let Err(err) = self.notifier.notify(title, message, sound) {
            log::warn!("⚠️ 发送通知失败: {}", err);
        }
    }

    /// 运行轮询循环，直到 `shutdown` 完成
    pub async fn run<F>(mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        self.send_notification("2FA Monitor Active", "Monitoring for 2FA codes in Messages", true);
        log::info!(
            "👀 每 {}ms 轮询一次消息数据库，按 Ctrl+C 停止",
            self.options.poll_interval.as_millis()
        );

        let mut ticker = tokio::time::interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycles: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.poll_once();
                    cycles += 1;
                }
            }
        }

        let summary = RunSummary {
            cycles,
            codes_emitted: self.session.emitted_total(),
            watermark: self.session.watermark(),
        };
        log::info!("=== 2FA 监控停止 ===");
        log::info!(
            "本次会话共发出 {} 个验证码（{} 轮轮询，水位线 {}）",
            summary.codes_emitted,
            summary.cycles,
            summary.watermark
        );
        self.send_notification("2FA Monitor", "2FA Code Monitor stopped", false);
        summary
    }
}
