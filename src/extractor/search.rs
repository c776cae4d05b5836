// src/extractor/search.rs

use super::{
    fetch_html,
    selectors::{attr, cascade, compact_text, css, page_base, resolve},
};
use crate::{
    client::SessionClient,
    constants,
    error::*,
    models::SearchResult,
};
use log::{debug, info, warn};
use scraper::{ElementRef, Html, Selector};
use std::sync::{Arc, LazyLock};
use url::Url;

static RESULT_ITEM: LazyLock<Selector> =
    LazyLock::new(|| css("div#searchResultBox div.book-item.resItemBoxBooks"));
static BOOKCARD: LazyLock<Selector> = LazyLock::new(|| css("z-bookcard"));
static BOOKCARD_TITLE: LazyLock<Selector> = LazyLock::new(|| css("div[slot='title']"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| css("h3[itemprop='name'] a"));

const TITLE_PLACEHOLDER: &str = "Title N/A";

/// 一次搜索的结果。
///
/// `issues` 不为空时表示部分条目解析失败：`results` 仍包含所有成功解析的条目，
/// 调用方应把它当作部分成功处理。
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub final_url: String,
    pub issues: Option<ExtractionIssues>,
}

impl SearchOutcome {
    pub fn is_partial(&self) -> bool {
        self.issues.is_some()
    }
}

pub struct SearchExtractor {
    session: Arc<SessionClient>,
}

impl SearchExtractor {
    pub fn new(session: Arc<SessionClient>) -> Self {
        Self { session }
    }

    pub async fn search(&self, query: &str) -> AppResult<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::EmptyQuery);
        }

        let base_url = &self.session.config().base_url;
        let search_url = build_search_url(base_url, query)?;
        info!("搜索: {}", search_url);

        let page = fetch_html(&self.session, &search_url).await?;
        let (results, issues) = parse_search_results(&page.body, &page.final_url, base_url);

        if !issues.is_empty() {
            warn!(
                "搜索结果页 '{}' 中有 {} 个条目解析失败",
                page.final_url,
                issues.len()
            );
        }
        info!("搜索 '{}' 得到 {} 个结果", query, results.len());

        Ok(SearchOutcome {
            results,
            final_url: page.final_url,
            issues: ExtractionIssues::from_messages(issues),
        })
    }
}

/// 在站点根地址后拼接搜索路径和查询参数
pub fn build_search_url(base_url: &str, query: &str) -> AppResult<String> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut url = base.join(constants::SEARCH_PATH.trim_start_matches('/'))?;
    url.query_pairs_mut()
        .append_pair(constants::SEARCH_QUERY_PARAM, query);
    Ok(url.into())
}

/// 解析搜索结果页，返回成功解析的条目和每个失败条目的描述
pub fn parse_search_results(
    html: &str,
    final_url: &str,
    fallback_base: &str,
) -> (Vec<SearchResult>, Vec<String>) {
    let document = Html::parse_document(html);
    let mut issues = Vec::new();
    let Some(base) = page_base(final_url, fallback_base, &mut issues) else {
        return (Vec::new(), issues);
    };

    let mut results = Vec::new();
    for (i, item) in document.select(&RESULT_ITEM).enumerate() {
        let card = Card { item, base: &base };
        match cascade(&card, &[Card::from_bookcard, Card::from_title_link]) {
            Some(Ok(result)) => {
                debug!("条目 {}: '{}' -> {}", i, result.title, result.url);
                results.push(result);
            }
            Some(Err(msg)) => issues.push(format!("条目 {}: {}", i, msg)),
            None => issues.push(format!(
                "条目 {}: 未找到 z-bookcard 或标题链接，已跳过",
                i
            )),
        }
    }
    (results, issues)
}

/// 搜索结果中的单个条目。每个策略在找不到对应标记时返回 `None`，
/// 找到标记但内容不完整时返回错误描述。
struct Card<'a> {
    item: ElementRef<'a>,
    base: &'a Url,
}

impl Card<'_> {
    fn from_bookcard(&self) -> Option<Result<SearchResult, String>> {
        let card = self.item.select(&BOOKCARD).next()?;
        let Some(href) = attr(card, "href") else {
            return Some(Err("z-bookcard 缺少 href 属性，已跳过".to_string()));
        };

        let title = card
            .select(&BOOKCARD_TITLE)
            .next()
            .map(compact_text)
            .filter(|t| !t.is_empty())
            .or_else(|| self.title_link().map(compact_text).filter(|t| !t.is_empty()))
            .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());

        Some(resolve(self.base, href).map(|url| SearchResult {
            title,
            url,
            book_id: attr(card, "id").map(str::to_string),
        }))
    }

    fn from_title_link(&self) -> Option<Result<SearchResult, String>> {
        let link = self.title_link()?;
        let Some(href) = attr(link, "href") else {
            return Some(Err("找到标题链接但缺少 href，已跳过".to_string()));
        };
        Some(resolve(self.base, href).map(|url| SearchResult {
            title: compact_text(link),
            url,
            book_id: None,
        }))
    }

    fn title_link(&self) -> Option<ElementRef<'_>> {
        self.item.select(&TITLE_LINK).next()
    }
}
