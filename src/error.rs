// src/error.rs

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("搜索关键词不能为空")]
    EmptyQuery,
    #[error("请求 '{url}' 失败: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP 客户端初始化失败: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("服务器返回状态 {status}\nURL: {url}\n响应: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },
    #[error("下载失败: 收到的是 HTML 页面而不是文件 (URL: {url})，可能需要登录、验证码或已达下载上限")]
    UnexpectedHtml { url: String },
    #[error("意外的内容类型 '{content_type}' (URL: {url})")]
    UnexpectedContentType { content_type: String, url: String },
    #[error("响应内容为空 (URL: {url})")]
    EmptyBody { url: String },
    #[error("读取来自 '{url}' 的响应内容失败: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("下载中断 (已写入 {bytes_written} 字节): {source}")]
    DownloadInterrupted {
        bytes_written: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),
    #[error("用户中断")]
    UserInterrupt,
    #[error("{0}")] // 只打印内部信息，不加任何前缀
    UserInputError(String),
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// 请求本身是否因超时失败
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::RequestFailed { source, .. } if source.is_timeout())
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 提取过程中的软错误集合：单个条目或字段解析失败，不影响其余数据。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("解析过程中遇到 {} 个错误:\n- {}", .0.len(), .0.join("\n- "))]
pub struct ExtractionIssues(pub Vec<String>);

impl ExtractionIssues {
    pub fn from_messages(messages: Vec<String>) -> Option<Self> {
        if messages.is_empty() {
            None
        } else {
            Some(Self(messages))
        }
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

pub type AppResult<T> = Result<T, AppError>;
