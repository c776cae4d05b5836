// src/extractor/mod.rs

pub mod details;
pub mod search;
pub(crate) mod selectors;

pub use details::{DetailExtractor, DetailsOutcome};
pub use search::{SearchExtractor, SearchOutcome};

use crate::{
    client::{SessionClient, body_snippet},
    error::*,
};
use log::debug;
use reqwest::StatusCode;

/// 状态为 200 的 HTML 页面
pub(crate) struct FetchedPage {
    pub body: String,
    /// 重定向后的最终地址，页面内的相对链接都以它为基准
    pub final_url: String,
}

/// 通过会话客户端获取一个 HTML 页面。非 200 的响应会被转成带响应片段的错误。
pub(crate) async fn fetch_html(session: &SessionClient, url: &str) -> AppResult<FetchedPage> {
    let res = session.fetch(url).await?;
    let final_url = res.url().to_string();
    let status = res.status();

    if status != StatusCode::OK {
        return Err(AppError::HttpStatus {
            status,
            url: final_url,
            snippet: body_snippet(res).await,
        });
    }

    let body = res.text().await.map_err(|source| AppError::BodyRead {
        url: final_url.clone(),
        source,
    })?;
    debug!("已获取页面 '{}' ({} 字节)", final_url, body.len());
    Ok(FetchedPage { body, final_url })
}
