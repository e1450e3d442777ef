//! 验证码特征检测模块
//!
//! # 设计思路
//!
//! 短信中的一次性验证码没有统一格式，这里用 4 条按优先级排列的正则规则做语法层面的识别，
//! 不判断语义（"订单号 1234" 同样会被识别）。优先级固定：
//! 1. 6 位数字
//! 2. 4 位数字
//! 3. 6 位大写字母/数字
//! 4. 4 位大写字母/数字
//!
//! 只要高优先级规则在全文任意位置命中，就不再考虑低优先级规则；
//! 同一规则内取最左侧的匹配。所有规则都要求单词边界，避免从电话号码、日期等更长的数字串中截取子串。
//!
//! # 实现思路
//!
//! - 使用 `RegexSet` 一次扫描得到所有命中的规则，再用对应的单条 `Regex` 定位最左匹配。
//! - 通过 `once_cell::sync::Lazy` 在首次调用时编译正则，后续零成本复用。

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use serde::Serialize;

/// 验证码格式类别，声明顺序即匹配优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PatternClass {
    #[serde(rename = "6-digit")]
    SixDigit,
    #[serde(rename = "4-digit")]
    FourDigit,
    #[serde(rename = "6-char")]
    SixAlnum,
    #[serde(rename = "4-char")]
    FourAlnum,
}

impl PatternClass {
    /// 按优先级排列的全部类别
    pub const PRIORITY: [PatternClass; 4] = [
        PatternClass::SixDigit,
        PatternClass::FourDigit,
        PatternClass::SixAlnum,
        PatternClass::FourAlnum,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PatternClass::SixDigit => "6-digit",
            PatternClass::FourDigit => "4-digit",
            PatternClass::SixAlnum => "6-char",
            PatternClass::FourAlnum => "4-char",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            PatternClass::SixDigit => r"\b\d{6}\b",
            PatternClass::FourDigit => r"\b\d{4}\b",
            PatternClass::SixAlnum => r"\b[A-Z0-9]{6}\b",
            PatternClass::FourAlnum => r"\b[A-Z0-9]{4}\b",
        }
    }
}

impl fmt::Display for PatternClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 候选验证码：尚未经过去重
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateCode {
    pub value: String,
    pub pattern: PatternClass,
}

/// 预编译的规则集合：判断哪些规则在文本中有命中
static CODE_RULE_SET: Lazy<RegexSet> =
    Lazy::new(|| RegexSet::new(PatternClass::PRIORITY.iter().map(|class| class.pattern())).unwrap());

/// 与 `CODE_RULE_SET` 下标一一对应的单条规则，用于定位匹配位置
static CODE_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    PatternClass::PRIORITY
        .iter()
        .map(|class| Regex::new(class.pattern()).unwrap())
        .collect()
});

/// 从文本中提取验证码
///
/// # 参数
/// * `text` - 已还原的消息正文
///
/// # 返回
/// - `Some(CandidateCode)`：最高优先级命中规则的最左匹配
/// - `None`：没有任何规则命中
pub fn extract_code(text: &str) -> Option<CandidateCode> {
    let index = CODE_RULE_SET.matches(text).iter().next()?;
    let found = CODE_RULES[index].find(text)?;
    let pattern = PatternClass::PRIORITY[index];
    log::debug!("🔎 命中 {} 验证码: {}", pattern, found.as_str());
    Some(CandidateCode {
        value: found.as_str().to_string(),
        pattern,
    })
}
