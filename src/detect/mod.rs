//! 验证码识别模块
//!
//! # 设计思路
//!
//! 将"从一条消息得到一个新验证码"拆成三个纯内存步骤：
//! - **文本还原**：`normalize` 从编码载荷中尽力恢复可读文本
//! - **验证码提取**：`code_detection` 按优先级匹配 4 类验证码格式
//! - **去重**：`dedup` 维护有界的已发出验证码历史
//!
//! # 实现思路
//!
//! - 三个子模块均不做 I/O、不持有全局可变状态，可独立测试。
//! - 子模块按职责拆分，上层 `monitor` 负责串联。

pub mod code_detection;
pub mod dedup;
pub mod normalize;

pub use code_detection::{extract_code, CandidateCode, PatternClass};
pub use dedup::{Consideration, DedupHistory, DEFAULT_HISTORY_CAPACITY};
pub use normalize::{normalize_payload, resolve_text};
