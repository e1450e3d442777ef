//! 已发出验证码的有界历史
//!
//! 同一条验证码常被服务商重复发送，或同时出现在纯文本与富文本两列中。
//! 这里只记住最近 N 个已发出的验证码，超出容量后按先进先出淘汰。
//! 淘汰后的验证码再次出现会被视为新事件：很久之后收到的同一数字是一次新的认证。

use std::collections::VecDeque;

/// 默认去重窗口大小
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// `consider_code` 的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consideration {
    pub is_new: bool,
}

/// 按发出顺序保存的验证码历史
///
/// 成员判断为精确字符串比较，不做大小写或前导零归一。
#[derive(Debug, Clone)]
pub struct DedupHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for DedupHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl DedupHistory {
    /// 创建指定容量的历史，容量至少为 1
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// 判断验证码是否未出现在当前窗口内
    ///
    /// 结果为新时，调用方随后需要调用 `record_emitted`。
    pub fn consider_code(&self, code: &str) -> Consideration {
        Consideration {
            is_new: !self.contains(code),
        }
    }

    /// 记录一次已发出的验证码，超出容量时淘汰最旧的条目
    pub fn record_emitted(&mut self, code: &str) {
        self.entries.push_back(code.to_string());
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                log::debug!("🧹 去重窗口已满，淘汰最旧验证码: {}", evicted);
            }
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|entry| entry == code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 按发出顺序（最旧在前）遍历
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn recorded_code_is_no_longer_new() {
        let mut history = DedupHistory::default();
        assert!(history.consider_code("482913").is_new);
        history.record_emitted("482913");
        assert!(!history.consider_code("482913").is_new);
    }

    #[test]
    fn membership_is_exact() {
        let mut history = DedupHistory::default();
        history.record_emitted("AB12");
        assert!(history.consider_code("ab12").is_new);
        history.record_emitted("0123");
        assert!(history.consider_code("123").is_new);
    }

    #[test]
    fn oldest_code_evicted_after_capacity() {
        let mut history = DedupHistory::default();
        history.record_emitted("000000");
        for i in 1..10 {
            history.record_emitted(&format!("{i:06}"));
            assert!(!history.consider_code("000000").is_new);
        }
        history.record_emitted("000010");
        assert_eq!(history.len(), 10);
        assert!(history.consider_code("000000").is_new);
        assert_eq!(history.iter().next(), Some("000001"));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut history = DedupHistory::with_capacity(0);
        history.record_emitted("1111");
        history.record_emitted("2222");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["2222"]);
    }

    proptest! {
        #[test]
        fn size_never_exceeds_capacity(codes in proptest::collection::vec("[0-9]{4,6}", 0..64), capacity in 1usize..16) {
            let mut history = DedupHistory::with_capacity(capacity);
            for code in &codes {
                history.record_emitted(code);
                prop_assert!(history.len() <= capacity);
            }
        }

        #[test]
        fn code_stays_known_until_capacity_others_recorded(
            first in "[0-9]{6}",
            others in proptest::collection::hash_set("[A-Z]{4}", 0..20),
        ) {
            let mut history = DedupHistory::default();
            history.record_emitted(&first);
            for (recorded, other) in others.iter().enumerate() {
                if recorded < DEFAULT_HISTORY_CAPACITY {
                    prop_assert!(!history.consider_code(&first).is_new);
                }
                history.record_emitted(other);
            }
            if others.len() >= DEFAULT_HISTORY_CAPACITY {
                prop_assert!(history.consider_code(&first).is_new);
            } else {
                prop_assert!(!history.consider_code(&first).is_new);
            }
        }
    }
}
