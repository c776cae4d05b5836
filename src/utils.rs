// src/utils.rs

use crate::{constants, models::BookDetails};
use regex::Regex;
use std::{collections::BTreeSet, sync::LazyLock};

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static REPEATED_DOTS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// 清理文件名: 删除非法字符，折叠连续的点和空白，并限制长度
pub fn sanitize_filename(name: &str) -> String {
    let name = ILLEGAL_CHARS_RE.replace_all(name, "");
    let name = REPEATED_DOTS_RE.replace_all(&name, ".");
    let name = WHITESPACE_RE.replace_all(&name, " ");
    let mut name = name.trim_matches(|c: char| c == '.' || c == ' ').to_string();

    if name.len() > constants::MAX_FILENAME_BYTES {
        let cut = safe_truncate_utf8(&name, constants::MAX_FILENAME_BYTES);
        // 尽量在单词边界处截断
        let cut = match cut.rfind(' ') {
            Some(pos) if pos > 0 => &cut[..pos],
            _ => cut,
        };
        name = cut.trim_matches(|c: char| c == '.' || c == ' ').to_string();
    }

    if name.is_empty() {
        return constants::FALLBACK_FILENAME.to_string();
    }
    name
}

/// 下载文件名: `{作者} - {书名}.{扩展名}`
pub fn book_filename(details: &BookDetails) -> String {
    let author = details
        .author
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(constants::UNKNOWN_AUTHOR);
    let title = details
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(constants::UNKNOWN_TITLE);
    let ext = details
        .known_format()
        .map(|f| sanitize_extension(&f.to_lowercase()))
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| constants::DEFAULT_EXTENSION.to_string());

    let stem = sanitize_filename(&format!("{} - {}", author, title));
    format!("{}.{}", stem, ext)
}

fn sanitize_extension(ext: &str) -> String {
    ext.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// 以 1024 为进制格式化字节数
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < 5 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = "KMGTPE".as_bytes()[exp] as char;
    format!("{:.1} {}B", bytes as f64 / div as f64, prefix)
}

/// 截取响应内容用于错误信息，超长时追加 `...`
pub fn snippet(body: &str, max_bytes: usize) -> String {
    let trimmed = body.trim();
    let cut = safe_truncate_utf8(trimmed, max_bytes);
    if cut.len() < trimmed.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}

pub(crate) fn safe_truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes { return s; }
    let mut i = max_bytes;
    while i > 0 && !s.is_char_boundary(i) { i -= 1; }
    &s[..i]
}

/// 按显示宽度截断文本 (全角字符计为 2)
pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 { text.to_string() } else { format!("{}...", &text[..end_pos]) }
}

/// 解析 `1,3`、`2-4`、`all` 形式的选择，返回去重排序后的 0 基索引
pub fn parse_selection_indices(selection_str: &str, total_items: usize) -> Vec<usize> {
    if selection_str.trim().eq_ignore_ascii_case("all") { return (0..total_items).collect(); }
    let mut indices = BTreeSet::new();
    for part in selection_str.split(',').map(|s| s.trim()) {
        if part.is_empty() { continue; }
        if let Some((start, end)) = part.split_once('-') {
            if let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>()) {
                if start == 0 || end == 0 { continue; }
                let (min, max) = (start.min(end), start.max(end).min(total_items));
                indices.extend((min..=max).map(|i| i - 1));
            }
        } else if let Ok(num) = part.parse::<usize>() {
            if num > 0 && num <= total_items { indices.insert(num - 1); }
        }
    }
    indices.into_iter().collect()
}
