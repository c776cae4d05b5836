// src/extractor/details.rs

use super::{
    fetch_html,
    selectors::{
        attr, cascade, compact_text, css, element_text, non_empty_string, page_base, resolve,
        resolve_or_warn,
    },
};
use crate::{
    client::SessionClient,
    constants,
    error::*,
    models::{BookDetails, Category, DownloadFormat, FormatLink},
};
use log::{debug, info, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::{
    collections::HashSet,
    sync::{Arc, LazyLock},
};
use url::Url;

static BOOKCARD: LazyLock<Selector> = LazyLock::new(|| css("z-bookcard"));
static BOOK_ID_META: LazyLock<Selector> = LazyLock::new(|| css("meta[name='book_id']"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| css("h1.book-title[itemprop='name']"));
static MAIN_INFO: LazyLock<Selector> = LazyLock::new(|| css("div.book-main-info"));
static MAIN_COLUMN: LazyLock<Selector> = LazyLock::new(|| css("div.col-sm-9"));
static AUTHOR_ITEMPROP: LazyLock<Selector> =
    LazyLock::new(|| css("a.color1[itemprop='author']"));
static AUTHOR_GENRE_LINK: LazyLock<Selector> = LazyLock::new(|| css("a.color1[href*='/g/']"));
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| css("div#bookDescriptionBox div[itemprop='description']"));
static DESCRIPTION_BOX: LazyLock<Selector> = LazyLock::new(|| css("div#bookDescriptionBox"));
static RATING_INTEREST: LazyLock<Selector> =
    LazyLock::new(|| css("span.book-rating-interest-score"));
static RATING_INTEREST_ALT: LazyLock<Selector> =
    LazyLock::new(|| css(".rating-interest .rating-value"));
static RATING_QUALITY: LazyLock<Selector> =
    LazyLock::new(|| css("span.book-rating-quality-score"));
static RATING_QUALITY_ALT: LazyLock<Selector> =
    LazyLock::new(|| css(".rating-quality .rating-value"));

static PROPERTY: LazyLock<Selector> =
    LazyLock::new(|| css("div.bookDetailsBox div.property, div.properties div.property"));
static PROPERTY_LABEL: LazyLock<Selector> =
    LazyLock::new(|| css(".property_label, .property__label"));
static PROPERTY_VALUE: LazyLock<Selector> =
    LazyLock::new(|| css(".property_value, .property__value"));
static LINK: LazyLock<Selector> = LazyLock::new(|| css("a"));
static DATA_COPY: LazyLock<Selector> = LazyLock::new(|| css("span[data-copy]"));

static COVER_COMPONENT: LazyLock<Selector> = LazyLock::new(|| css("z-cover img"));
static COVER_ITEMPROP: LazyLock<Selector> = LazyLock::new(|| css("img[itemprop='image']"));
static COVER_LEGACY: LazyLock<Selector> =
    LazyLock::new(|| css(".z-book-cover img, .book-img img"));

static PRIMARY_BUTTONS: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    [
        css("a.btn-primary[href*='/dl/']"),
        css("a.btn-primary[href*='/download']"),
        css("a.addDownloadedBook[href*='/dl/']"),
    ]
});
static FORMAT_SPAN: LazyLock<Selector> = LazyLock::new(|| {
    css("span.book-property__extension, span.download-formats-single__item")
});
static OTHER_FORMAT_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    css("#bookOtherFormatsContainer a.addDownloadedBook, .download-formats__items a")
});
static OTHER_FORMAT_SPAN: LazyLock<Selector> = LazyLock::new(|| {
    css("span.book-property__extension, span.download-formats-single__item, span")
});
static CONVERSION_LINKS: LazyLock<Selector> =
    LazyLock::new(|| css(".convert-to-list a.converterLink, .js-convert-item"));

static BOOK_ID_IN_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/book/(\d+)/").unwrap());
static FORMAT_IN_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", constants::KNOWN_FORMATS.join("|"))).unwrap()
});
static SIZE_IN_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?\s*(?:kb|mb|gb))").unwrap());
static FORMAT_IN_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\.({})$", constants::KNOWN_FORMATS.join("|"))).unwrap()
});

/// 一次详情页请求的结果。`issues` 为软错误，`details` 总是尽力填充。
#[derive(Debug, Clone)]
pub struct DetailsOutcome {
    pub details: BookDetails,
    pub final_url: String,
    pub issues: Option<ExtractionIssues>,
}

pub struct DetailExtractor {
    session: Arc<SessionClient>,
}

impl DetailExtractor {
    pub fn new(session: Arc<SessionClient>) -> Self {
        Self { session }
    }

    pub async fn fetch_details(&self, url: &str) -> AppResult<DetailsOutcome> {
        info!("获取详情页: {}", url);
        let page = fetch_html(&self.session, url).await?;
        let (details, issues) = parse_book_details(
            &page.body,
            url,
            &page.final_url,
            &self.session.config().base_url,
        );

        for issue in &issues {
            warn!("详情页 '{}': {}", page.final_url, issue);
        }
        info!(
            "详情页解析完成: '{}'",
            details.title.as_deref().unwrap_or("(无标题)")
        );

        Ok(DetailsOutcome {
            details,
            final_url: page.final_url,
            issues: ExtractionIssues::from_messages(issues),
        })
    }
}

/// 解析详情页。找不到的字段保持为 `None`，无法处理的内容记录为软错误。
pub fn parse_book_details(
    html: &str,
    page_url: &str,
    final_url: &str,
    fallback_base: &str,
) -> (BookDetails, Vec<String>) {
    let doc = Html::parse_document(html);
    let mut issues = Vec::new();
    let mut details = BookDetails {
        url: page_url.to_string(),
        ..Default::default()
    };
    let Some(base) = page_base(final_url, fallback_base, &mut issues) else {
        return (details, issues);
    };
    let page = Page {
        doc: &doc,
        base: &base,
        page_url,
        final_url,
    };

    details.book_id = cascade(
        &page,
        &[Page::id_from_bookcard, Page::id_from_urls, Page::id_from_meta],
    );
    details.title = page.first_text(&TITLE);
    if let Some(link) = cascade(
        &page,
        &[
            Page::author_in_main_info,
            Page::author_in_main_column,
            Page::author_anywhere,
        ],
    ) {
        let name = compact_text(link);
        details.author = non_empty_string(name);
        details.author_url = attr(link, "href")
            .and_then(|href| resolve_or_warn(page.base, href, "作者链接"));
    }
    details.description = page.first_text_of(&[&*DESCRIPTION, &*DESCRIPTION_BOX]);
    details.rating_interest = page.first_text_of(&[&*RATING_INTEREST, &*RATING_INTEREST_ALT]);
    details.rating_quality = page.first_text_of(&[&*RATING_QUALITY, &*RATING_QUALITY_ALT]);

    page.apply_properties(&mut details);
    details.cover_url = page.cover_url(&mut issues);
    page.apply_primary_download(&mut details, &mut issues);
    page.collect_other_formats(&mut details);
    page.collect_conversions(&mut details);
    finalize(&mut details);

    (details, issues)
}

/// 解析完成后的交叉推断:
/// 没有主下载链接时提升第一个可直接下载的其他格式；主链接格式未知时从扩展名推断。
/// 格式或大小仍然未知只记录警告，不算解析错误。
pub fn finalize(details: &mut BookDetails) {
    if details.download_url.is_none()
        && let Some(url) = details
            .other_formats
            .first()
            .and_then(|f| f.link.direct_url())
            .map(str::to_string)
    {
        let promoted = details.other_formats.remove(0);
        warn!(
            "页面没有主下载按钮，使用第一个其他格式 '{}' 作为主下载链接: {}",
            promoted.format, url
        );
        if details.known_format().is_none() {
            details.file_format = Some(promoted.format);
        }
        details.download_url = Some(url);
    }

    let Some(url) = details.download_url.clone() else {
        return;
    };
    if details.known_format().is_none() {
        match extension_from_url(&url) {
            Some(ext) => {
                debug!("从下载链接推断格式: {}", ext);
                details.file_format = Some(ext);
            }
            None => warn!("无法确定下载文件的格式: {}", url),
        }
    }
    if details.known_size().is_none() {
        warn!("下载文件大小未知: {}", url);
    }
}

/// URL 路径最后一段的扩展名 (2-5 个字符)，小写
fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let (_, ext) = last_segment.rsplit_once('.')?;
    ((2..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_lowercase())
}

/// 把属性标签规整为字段名: 小写、去掉末尾冒号、空格替换为下划线
fn normalize_label(label: &str) -> String {
    label
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

struct Page<'a> {
    doc: &'a Html,
    base: &'a Url,
    page_url: &'a str,
    final_url: &'a str,
}

impl<'a> Page<'a> {
    fn first(&self, selector: &Selector) -> Option<ElementRef<'a>> {
        self.doc.select(selector).next()
    }

    fn first_text(&self, selector: &Selector) -> Option<String> {
        self.first(selector)
            .map(element_text)
            .and_then(non_empty_string)
    }

    /// 按顺序尝试多个选择器，取第一个非空文本
    fn first_text_of(&self, selectors: &[&Selector]) -> Option<String> {
        selectors.iter().find_map(|selector| self.first_text(selector))
    }

    fn id_from_bookcard(&self) -> Option<String> {
        self.first(&BOOKCARD)
            .and_then(|card| attr(card, "id"))
            .map(str::to_string)
    }

    fn id_from_urls(&self) -> Option<String> {
        [self.final_url, self.page_url].iter().find_map(|url| {
            BOOK_ID_IN_URL_RE
                .captures(url)
                .map(|caps| caps[1].to_string())
        })
    }

    fn id_from_meta(&self) -> Option<String> {
        self.first(&BOOK_ID_META)
            .and_then(|meta| attr(meta, "content"))
            .map(str::to_string)
    }

    fn author_in(&self, container: &Selector) -> Option<ElementRef<'a>> {
        let container = self.first(container)?;
        container
            .select(&AUTHOR_ITEMPROP)
            .next()
            .or_else(|| container.select(&AUTHOR_GENRE_LINK).next())
    }

    fn author_in_main_info(&self) -> Option<ElementRef<'a>> {
        self.author_in(&MAIN_INFO)
    }

    fn author_in_main_column(&self) -> Option<ElementRef<'a>> {
        self.author_in(&MAIN_COLUMN)
    }

    fn author_anywhere(&self) -> Option<ElementRef<'a>> {
        self.first(&AUTHOR_ITEMPROP)
            .or_else(|| self.first(&AUTHOR_GENRE_LINK))
    }

    /// 遍历属性列表，按规整后的标签写入对应字段
    fn apply_properties(&self, details: &mut BookDetails) {
        let mut fallback_format = None;
        let mut fallback_size = None;

        for property in self.doc.select(&PROPERTY) {
            let (Some(label), Some(value)) = (
                property.select(&PROPERTY_LABEL).next(),
                property.select(&PROPERTY_VALUE).next(),
            ) else {
                continue;
            };
            let key = normalize_label(&element_text(label));
            let text = compact_text(value);

            match key.as_str() {
                "categories" => details.categories = self.categories(value, text),
                "file" => {
                    let mut parts = text.split(',').map(str::trim);
                    if let Some(format) = parts.next().filter(|p| !p.is_empty()) {
                        details.file_format = Some(format.to_lowercase());
                    }
                    if let Some(size) = parts.next().filter(|p| !p.is_empty()) {
                        details.file_size = Some(size.to_string());
                    }
                }
                key if key.starts_with("ipfs") => {
                    let mut ids = value
                        .select(&DATA_COPY)
                        .filter_map(|span| attr(span, "data-copy"));
                    details.ipfs_cid = ids.next().map(str::to_string);
                    details.ipfs_cid_blake2b = ids.next().map(str::to_string);
                }
                "content_type" => details.content_type = Some(text),
                "volume" => details.volume = Some(text),
                "year" => details.year = Some(text),
                "publisher" => details.publisher = Some(text),
                "language" => details.language = Some(text),
                "isbn_10" => details.isbn_10 = Some(text),
                "isbn_13" => details.isbn_13 = Some(text),
                "series" => details.series = Some(text),
                "format" => fallback_format = Some(text.to_lowercase()),
                "size" => fallback_size = Some(text),
                other => debug!("忽略未知属性 '{}': {}", other, text),
            }
        }

        if details.known_format().is_none() && fallback_format.is_some() {
            details.file_format = fallback_format;
        }
        if details.known_size().is_none() && fallback_size.is_some() {
            details.file_size = fallback_size;
        }
    }

    fn categories(&self, value: ElementRef<'_>, text: String) -> Vec<Category> {
        let categories: Vec<Category> = value
            .select(&LINK)
            .filter_map(|link| {
                let name = non_empty_string(compact_text(link))?;
                let url = attr(link, "href")
                    .and_then(|href| resolve_or_warn(self.base, href, "分类链接"));
                Some(Category { name, url })
            })
            .collect();
        if categories.is_empty() && !text.is_empty() {
            return vec![Category {
                name: text,
                url: None,
            }];
        }
        categories
    }

    /// 依次尝试三级封面选择器，并把缩略图地址升级为较大尺寸
    fn cover_url(&self, issues: &mut Vec<String>) -> Option<String> {
        let raw = [&*COVER_COMPONENT, &*COVER_ITEMPROP, &*COVER_LEGACY]
            .into_iter()
            .find_map(|selector| {
                self.doc.select(selector).find_map(|img| {
                    attr(img, "data-src")
                        .or_else(|| attr(img, "src"))
                        .filter(|src| !src.starts_with("data:"))
                })
            })?;

        let upgraded = upgrade_cover_resolution(raw);
        match resolve(self.base, &upgraded) {
            Ok(url) => Some(url),
            Err(msg) if upgraded.starts_with("http") => {
                debug!("封面地址无法解析，保留原值: {}", msg);
                Some(upgraded)
            }
            Err(msg) => {
                issues.push(format!("封面: {}", msg));
                None
            }
        }
    }

    fn apply_primary_download(&self, details: &mut BookDetails, issues: &mut Vec<String>) {
        let Some((button, href)) = PRIMARY_BUTTONS.iter().find_map(|selector| {
            self.doc
                .select(selector)
                .find_map(|a| attr(a, "href").map(|href| (a, href)))
        }) else {
            debug!("未找到主下载按钮");
            return;
        };

        match resolve(self.base, href) {
            Ok(url) => details.download_url = Some(url),
            Err(msg) => {
                issues.push(format!("主下载链接: {}", msg));
                return;
            }
        }

        let text = compact_text(button);
        if details.known_format().is_none() {
            details.file_format = FORMAT_IN_TEXT_RE
                .captures(&text)
                .map(|caps| caps[1].to_lowercase())
                .or_else(|| {
                    button
                        .select(&FORMAT_SPAN)
                        .next()
                        .map(compact_text)
                        .and_then(non_empty_string)
                        .map(|f| f.to_lowercase())
                })
                .or(details.file_format.take());
        }
        if details.known_size().is_none()
            && let Some(caps) = SIZE_IN_TEXT_RE.captures(&text)
        {
            details.file_size = Some(caps[1].to_string());
        }
    }

    fn collect_other_formats(&self, details: &mut BookDetails) {
        let mut seen: HashSet<String> = details
            .other_formats
            .iter()
            .map(|f| f.format.to_lowercase())
            .collect();

        for link in self.doc.select(&OTHER_FORMAT_LINKS) {
            let Some(href) = attr(link, "href") else {
                continue;
            };
            if !href.contains("/dl/") {
                debug!("忽略非直接下载的格式链接: {}", href);
                continue;
            }
            let format = link
                .select(&OTHER_FORMAT_SPAN)
                .next()
                .map(compact_text)
                .and_then(non_empty_string)
                .or_else(|| {
                    FORMAT_IN_HREF_RE
                        .captures(href)
                        .map(|caps| caps[1].to_string())
                });
            let Some(format) = format.map(|f| f.to_lowercase()) else {
                debug!("无法识别格式链接的格式: {}", href);
                continue;
            };
            let Some(url) = resolve_or_warn(self.base, href, "其他格式链接") else {
                continue;
            };
            // 主下载按钮可能就是格式列表中的第一项
            if details.download_url.as_deref() == Some(url.as_str()) {
                debug!("跳过与主下载链接相同的格式链接: {}", url);
                continue;
            }
            if !seen.insert(format.clone()) {
                continue;
            }
            details.other_formats.push(DownloadFormat {
                format,
                link: FormatLink::Direct(url),
            });
        }
    }

    fn collect_conversions(&self, details: &mut BookDetails) {
        let mut seen: HashSet<String> = details
            .other_formats
            .iter()
            .map(|f| f.format.to_lowercase())
            .collect();

        for item in self.doc.select(&CONVERSION_LINKS) {
            let format = attr(item, "data-convert_to")
                .map(str::to_string)
                .or_else(|| non_empty_string(compact_text(item)))
                .map(|f| f.to_lowercase());
            let Some(format) = format else {
                continue;
            };
            if seen.insert(format.clone()) {
                details.other_formats.push(DownloadFormat {
                    format,
                    link: FormatLink::ConversionRequired,
                });
            }
        }
    }
}

/// 把缩略图路径替换为较大尺寸: `covers100` -> `covers300`，否则第一个 `/s/` -> `/m/`
fn upgrade_cover_resolution(src: &str) -> String {
    if src.contains("covers100") {
        src.replace("covers100", "covers300")
    } else {
        src.replacen("/s/", "/m/", 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://example.org/book/123/abc/title.html";

    fn parse(html: &str) -> (BookDetails, Vec<String>) {
        parse_book_details(html, PAGE, PAGE, "https://example.org")
    }

    #[test]
    fn test_conversion_only_alternate_is_not_promoted() {
        let mut details = BookDetails {
            other_formats: vec![DownloadFormat {
                format: "pdf".into(),
                link: FormatLink::ConversionRequired,
            }],
            ..Default::default()
        };
        finalize(&mut details);
        assert_eq!(details.download_url, None);
        assert_eq!(details.other_formats.len(), 1);
    }

    #[test]
    fn test_direct_alternate_is_promoted() {
        let mut details = BookDetails {
            other_formats: vec![DownloadFormat {
                format: "epub".into(),
                link: FormatLink::Direct("https://example.org/dl/1".into()),
            }],
            ..Default::default()
        };
        finalize(&mut details);
        assert_eq!(details.download_url.as_deref(), Some("https://example.org/dl/1"));
        assert_eq!(details.file_format.as_deref(), Some("epub"));
        assert!(details.other_formats.is_empty());
    }

    #[test]
    fn test_format_inferred_from_url_extension() {
        let mut details = BookDetails {
            download_url: Some("https://example.org/dl/1/book.EPUB?x=1".into()),
            file_size: Some("1 MB".into()),
            ..Default::default()
        };
        finalize(&mut details);
        assert_eq!(details.file_format.as_deref(), Some("epub"));

        // 扩展名过长时不推断，格式保持未知
        let mut details = BookDetails {
            download_url: Some("https://example.org/dl/1/file.download".into()),
            ..Default::default()
        };
        finalize(&mut details);
        assert_eq!(details.file_format, None);
        assert_eq!(details.download_url.as_deref(), Some("https://example.org/dl/1/file.download"));
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label(" Content Type: "), "content_type");
        assert_eq!(normalize_label("ISBN 13:"), "isbn_13");
        assert_eq!(normalize_label("IPFS:"), "ipfs");
    }

    #[test]
    fn test_cover_resolution_upgrade() {
        assert_eq!(
            upgrade_cover_resolution("/covers100/books/a.jpg"),
            "/covers300/books/a.jpg"
        );
        assert_eq!(upgrade_cover_resolution("/img/s/s/a.jpg"), "/img/m/s/a.jpg");
    }

    #[test]
    fn test_properties_pass_routes_fields() {
        let html = r#"
            <div class="bookDetailsBox">
              <div class="property"><div class="property_label">Year:</div><div class="property_value">2019</div></div>
              <div class="property"><div class="property_label">Series:</div><div class="property_value"> </div></div>
              <div class="property"><div class="property__label">File:</div><div class="property__value">EPUB, 2.50 MB</div></div>
              <div class="property"><div class="property_label">Categories:</div>
                <div class="property_value"><a href="/category/1">Computers</a> - <a href="/category/2">Programming</a></div></div>
              <div class="property"><div class="property_label">IPFS:</div>
                <div class="property_value"><span data-copy="QmCid">CID</span><span data-copy="bafyAlt">Blake2b</span></div></div>
            </div>"#;
        let (details, _) = parse(html);
        assert_eq!(details.year.as_deref(), Some("2019"));
        // 站点给出的空值与缺失不同
        assert_eq!(details.series.as_deref(), Some(""));
        assert_eq!(details.publisher, None);
        assert_eq!(details.file_format.as_deref(), Some("epub"));
        assert_eq!(details.file_size.as_deref(), Some("2.50 MB"));
        assert_eq!(details.categories.len(), 2);
        assert_eq!(
            details.categories[1].url.as_deref(),
            Some("https://example.org/category/2")
        );
        assert_eq!(details.ipfs_cid.as_deref(), Some("QmCid"));
        assert_eq!(details.ipfs_cid_blake2b.as_deref(), Some("bafyAlt"));
        assert_eq!(details.book_id.as_deref(), Some("123"));
    }

    #[test]
    fn test_primary_button_text_mined_for_format_and_size() {
        let html = r#"
            <a class="btn btn-primary" href="/dl/555/x">Download (pdf, 3.4 MB)</a>
            <div class="convert-to-list">
              <a class="converterLink" data-convert_to="epub">EPUB</a>
              <a class="converterLink" data-convert_to="PDF">PDF</a>
            </div>"#;
        let (details, issues) = parse(html);
        assert_eq!(details.download_url.as_deref(), Some("https://example.org/dl/555/x"));
        assert_eq!(details.file_format.as_deref(), Some("pdf"));
        assert_eq!(details.file_size.as_deref(), Some("3.4 MB"));
        assert!(issues.is_empty());
        assert_eq!(details.other_formats.len(), 2);
        assert!(details.other_formats.iter().all(|f| f.link.is_conversion_required()));
        assert_eq!(
            details.other_formats[0].link.to_string(),
            constants::CONVERSION_SENTINEL
        );
    }

    #[test]
    fn test_data_uri_cover_falls_through_to_next_tier() {
        let html = r#"
            <z-cover><img src="data:image/png;base64,AAAA"></z-cover>
            <img itemprop="image" data-src="https://cdn.example.org/covers100/a.jpg">"#;
        let (details, _) = parse(html);
        assert_eq!(
            details.cover_url.as_deref(),
            Some("https://cdn.example.org/covers300/a.jpg")
        );
    }

    #[test]
    fn test_other_formats_deduplicated_and_direct_only() {
        let html = r#"
            <div class="download-formats__items">
              <a href="/dl/1/a"><span class="download-formats-single__item">MOBI</span></a>
              <a href="/dl/2/b"><span class="download-formats-single__item">mobi</span></a>
              <a href="/book/3/c.fb2">fb2</a>
              <a href="/dl/4/d.azw3"></a>
            </div>
            <div class="convert-to-list"><a class="converterLink" data-convert_to="azw3">AZW3</a></div>"#;
        let (details, _) = parse(html);
        // 没有主下载按钮，第一个直接链接被提升为主下载
        assert_eq!(details.download_url.as_deref(), Some("https://example.org/dl/1/a"));
        assert_eq!(details.file_format.as_deref(), Some("mobi"));
        assert_eq!(details.other_formats.len(), 1);
        assert_eq!(details.other_formats[0].format, "azw3");
        assert!(!details.other_formats[0].link.is_conversion_required());
    }

    #[test]
    fn test_primary_link_inside_formats_container_is_not_repeated() {
        let html = r#"
            <div id="bookOtherFormatsContainer">
              <a class="addDownloadedBook" href="/dl/1/a"><span class="book-property__extension">EPUB</span></a>
              <a class="addDownloadedBook" href="/dl/2/b"><span class="book-property__extension">PDF</span></a>
            </div>"#;
        let (details, _) = parse(html);
        assert_eq!(details.download_url.as_deref(), Some("https://example.org/dl/1/a"));
        assert_eq!(details.file_format.as_deref(), Some("epub"));
        let formats: Vec<&str> = details.other_formats.iter().map(|f| f.format.as_str()).collect();
        assert_eq!(formats, vec!["pdf"]);
    }
}
