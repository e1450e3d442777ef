//! 消息文本还原
//!
//! 部分消息的 `text` 列为空，正文只存在于 `attributedBody` 中。
//! 该字段是带有类型标记与元数据字节的富文本归档，这里不解析其结构，
//! 只做"尽力解码 + 过滤不可打印字符"，足以让后续正则命中验证码。
//!
//! 码点小于 32 的换行、制表符与其他控制字符一样被直接删除，不会变成空格。

use unicode_categories::UnicodeCategories;

/// 还原后文本的最短长度（字符数，需严格大于）
const MIN_TEXT_CHARS: usize = 3;

/// 从编码载荷中还原可读文本
///
/// # 处理步骤
/// 1. 按 UTF-8 解码，丢弃非法字节序列（不插入替换字符）。
/// 2. 若 UTF-8 解码后一个字符都没有，则按单字节（Latin-1）解码，该路径不会失败。
/// 3. 仅保留可打印或空白、且码点 ≥ 32 的字符。
/// 4. 连续空白折叠为单个空格，并去除首尾空白。
///
/// # 返回
/// - `Some(text)`：清洗后长度超过 3 个字符
/// - `None`：载荷为空，或只剩下元数据碎片
pub fn normalize_payload(payload: &[u8]) -> Option<String> {
    if payload.is_empty() {
        return None;
    }

    let mut decoded = decode_utf8_dropping_invalid(payload);
    if decoded.is_empty() {
        decoded = payload.iter().map(|&b| char::from(b)).collect();
    }

    let readable: String = decoded.chars().filter(|&c| is_readable(c)).collect();
    let collapsed = readable.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() > MIN_TEXT_CHARS {
        Some(collapsed)
    } else {
        None
    }
}

/// 解析消息正文：纯文本列缺失或为空串时回退到编码载荷
///
/// 纯文本只含空白时视为无正文，不再读取载荷。
pub fn resolve_text(plain: Option<&str>, payload: Option<&[u8]>) -> Option<String> {
    match plain {
        Some(text) if !text.is_empty() => {
            if text.trim().is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        _ => payload.and_then(normalize_payload),
    }
}

fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

fn is_readable(c: char) -> bool {
    (c as u32) >= 32 && (is_printable(c) || c.is_whitespace())
}

/// Unicode 可打印判定：除 ASCII 空格外，排除 Other（C*）与 Separator（Z*）类别
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !(c.is_other() || c.is_separator())
}
