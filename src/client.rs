// src/client.rs

use crate::{
    config::AppConfig,
    constants::{self, headers},
    error::*,
    utils,
};
use log::{debug, warn};
use reqwest::{
    Response, StatusCode,
    header::{self, HeaderMap, HeaderValue},
};
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

/// 带会话状态的 HTTP 客户端。
///
/// 所有请求共享同一个连接池和 Cookie 存储，并把最近一次成功访问的页面
/// 作为下一次请求的 `Referer`，模拟浏览器的正常浏览行为。本层不做任何重试。
#[derive(Clone)]
pub struct SessionClient {
    client: reqwest::Client,
    last_referrer: Arc<Mutex<String>>,
    config: Arc<AppConfig>,
}

impl SessionClient {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(browser_headers())
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(AppError::ClientBuild)?;

        // 初始 Referer 为站点根地址
        let initial_referrer = Url::parse(&config.base_url)
            .map(|u| u.to_string())
            .unwrap_or_default();

        Ok(Self {
            client,
            last_referrer: Arc::new(Mutex::new(initial_referrer)),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 当前用作 `Referer` 的地址
    pub fn last_referrer(&self) -> String {
        self.last_referrer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 发起 GET 请求。
    ///
    /// 任意状态码的响应都会原样返回，由调用方决定如何处理；只有 2xx/3xx 的
    /// 响应会更新 `Referer`，避免后续请求挂在错误页上。
    pub async fn fetch(&self, url: &str) -> AppResult<Response> {
        let referrer = self.last_referrer();
        let mut request = self.client.get(url);
        if !referrer.is_empty() {
            request = request.header(header::REFERER, referrer);
        }

        let res = request.send().await.map_err(|source| AppError::RequestFailed {
            url: url.to_string(),
            source,
        })?;

        let final_url = res.url().to_string();
        if final_url != url {
            debug!("请求 '{}' 被重定向至 '{}'", url, final_url);
        }
        let status = res.status();
        if status.is_success() || status.is_redirection() {
            *self
                .last_referrer
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = final_url;
        } else {
            debug!("请求 '{}' 返回状态 {}，Referer 保持不变", final_url, status);
        }
        Ok(res)
    }

    /// 获取图片的原始字节，交给外部解码。
    pub async fn fetch_image(&self, url: &str) -> AppResult<Vec<u8>> {
        debug!("获取图片: {}", url);
        let res = self.fetch(url).await?;
        let final_url = res.url().to_string();

        if res.status() != StatusCode::OK {
            let status = res.status();
            return Err(AppError::HttpStatus {
                status,
                url: final_url,
                snippet: String::new(),
            });
        }

        let content_type = content_type_of(&res);
        if !content_type.starts_with("image/") {
            warn!("图片地址 '{}' 返回了非图片内容: '{}'", final_url, content_type);
            return Err(AppError::UnexpectedContentType {
                content_type,
                url: final_url,
            });
        }

        let bytes = res.bytes().await.map_err(|source| AppError::BodyRead {
            url: final_url.clone(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(AppError::EmptyBody { url: final_url });
        }
        Ok(bytes.to_vec())
    }
}

/// 响应的 `Content-Type`，不存在时为空字符串
pub fn content_type_of(res: &Response) -> String {
    res.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase()
}

/// 读取响应体开头的片段用于错误信息，读够 [`constants::ERROR_SNIPPET_BYTES`] 字节即停止。
/// 读取失败时返回已读到的内容。
pub async fn body_snippet(mut res: Response) -> String {
    let limit = constants::ERROR_SNIPPET_BYTES;
    let mut buf: Vec<u8> = Vec::new();
    while buf.len() <= limit {
        match res.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                debug!("读取错误响应内容失败 ({}): {}", res.url(), e);
                break;
            }
        }
    }
    utils::snippet(&String::from_utf8_lossy(&buf), limit)
}

fn browser_headers() -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(header::ACCEPT, HeaderValue::from_static(headers::ACCEPT));
    map.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(headers::ACCEPT_LANGUAGE),
    );
    map.insert(header::DNT, HeaderValue::from_static(headers::DNT));
    map.insert(
        header::CONNECTION,
        HeaderValue::from_static(headers::CONNECTION),
    );
    map.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static(headers::UPGRADE_INSECURE_REQUESTS),
    );
    map
}
