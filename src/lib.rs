//! # 短信验证码监控 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  main.rs ── clap 参数 + 配置文件 + env_logger            │
//! │       │                                                  │
//! │       ↓  ctrl_c() 停止信号                               │
//! │  monitor::runner ── 定时轮询 / 派发 / 会话统计           │
//! │       │                     │                            │
//! │       ↓ fetch_since         ↓ write_text / notify        │
//! │  store (rusqlite 只读)   monitor::sink (arboard/osascript)│
//! │       │                                                  │
//! │       ↓ RawMessage 批次                                  │
//! │  monitor::MonitorSession ── 水位线 + 去重历史            │
//! │       │                                                  │
//! │       ↓                                                  │
//! │  detect ── normalize → code_detection → dedup            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，区分可恢复 I/O 与启动期致命错误 |
//! | [`config`] | JSON 配置读取、默认值与数值钳制 |
//! | [`detect`] | 文本还原、验证码正则提取、有界去重历史 |
//! | [`monitor`] | 消息水位线与识别流水线、剪贴板/通知能力接口、轮询调度 |
//! | [`store`] | Messages `chat.db` 只读查询与启动前权限检查 |

pub mod config;
pub mod detect;
pub mod error;
pub mod monitor;
pub mod store;
