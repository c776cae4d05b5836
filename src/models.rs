// src/models.rs

use crate::constants;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 搜索结果页中的一本书，顺序即站点排名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    /// 详情页的绝对地址
    pub url: String,
    pub book_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub url: Option<String>,
}

/// 其他格式的下载来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatLink {
    Direct(String),
    /// 需要服务端转换后才能下载
    ConversionRequired,
}

impl FormatLink {
    pub fn direct_url(&self) -> Option<&str> {
        match self {
            FormatLink::Direct(url) => Some(url),
            FormatLink::ConversionRequired => None,
        }
    }

    pub fn is_conversion_required(&self) -> bool {
        matches!(self, FormatLink::ConversionRequired)
    }
}

impl fmt::Display for FormatLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatLink::Direct(url) => f.write_str(url),
            FormatLink::ConversionRequired => f.write_str(constants::CONVERSION_SENTINEL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFormat {
    pub format: String,
    pub link: FormatLink,
}

/// 一本书的完整元数据。
///
/// 所有字段都可能缺失：`None` 表示页面上没找到，`Some("")` 表示站点给出了空值。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    /// 请求时使用的详情页地址
    pub url: String,
    pub book_id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub description: Option<String>,
    pub rating_interest: Option<String>,
    pub rating_quality: Option<String>,
    pub categories: Vec<Category>,
    pub content_type: Option<String>,
    pub volume: Option<String>,
    pub year: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub series: Option<String>,
    pub file_format: Option<String>,
    pub file_size: Option<String>,
    pub ipfs_cid: Option<String>,
    pub ipfs_cid_blake2b: Option<String>,
    pub cover_url: Option<String>,
    /// 主下载链接，总是可以直接下载的地址
    pub download_url: Option<String>,
    pub other_formats: Vec<DownloadFormat>,
}

impl BookDetails {
    /// 页面给出的格式名 (非空)
    pub fn known_format(&self) -> Option<&str> {
        non_empty(self.file_format.as_deref())
    }

    pub fn known_size(&self) -> Option<&str> {
        non_empty(self.file_size.as_deref())
    }

    /// 下载按钮上显示的文字
    pub fn download_label(&self) -> String {
        if self.download_url.is_none() {
            return if self
                .other_formats
                .iter()
                .any(|f| f.link.is_conversion_required())
            {
                "Download (conversion required)".to_string()
            } else {
                "Download (N/A)".to_string()
            };
        }
        match (self.known_format(), self.known_size()) {
            (Some(format), Some(size)) => format!("Download ({}, {})", format, size),
            (Some(format), None) => format!("Download ({})", format),
            _ => "Download".to_string(),
        }
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
