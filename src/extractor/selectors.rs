// src/extractor/selectors.rs

use log::warn;
use scraper::{ElementRef, Selector};
use url::Url;

/// 编译内置的 CSS 选择器，只用于 `LazyLock` 中的静态常量
pub(crate) fn css(selector: &str) -> Selector {
    Selector::parse(selector)
        .unwrap_or_else(|e| panic!("内置选择器 '{}' 无效: {:?}", selector, e))
}

/// 按优先级依次尝试各个提取策略，返回第一个成功的结果
pub(crate) fn cascade<C: ?Sized, T, F>(ctx: &C, strategies: &[F]) -> Option<T>
where
    F: Fn(&C) -> Option<T>,
{
    strategies.iter().find_map(|strategy| strategy(ctx))
}

/// 元素的文本内容，去掉首尾空白
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// 元素的文本内容，连续空白折叠为一个空格
pub(crate) fn compact_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn non_empty_string(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

/// 非空属性值
pub(crate) fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// 解析页面内链接的基准地址。最终地址无法解析时退回到站点根地址。
pub(crate) fn page_base(final_url: &str, fallback: &str, issues: &mut Vec<String>) -> Option<Url> {
    match Url::parse(final_url) {
        Ok(url) => Some(url),
        Err(e) => {
            issues.push(format!(
                "无法将最终地址 '{}' 作为基准地址: {}",
                final_url, e
            ));
            Url::parse(fallback).ok()
        }
    }
}

/// 将相对链接解析为绝对地址
pub(crate) fn resolve(base: &Url, href: &str) -> Result<String, String> {
    base.join(href)
        .map(String::from)
        .map_err(|e| format!("无法以 '{}' 为基准解析链接 '{}': {}", base, href, e))
}

/// 同 [`resolve`]，失败时只记录警告
pub(crate) fn resolve_or_warn(base: &Url, href: &str, what: &str) -> Option<String> {
    match resolve(base, href) {
        Ok(url) => Some(url),
        Err(msg) => {
            warn!("{}: {}", what, msg);
            None
        }
    }
}
