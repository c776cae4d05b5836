// src/downloader/mod.rs

pub mod progress;

pub use progress::{DownloadProgress, DownloadReport, ProgressSender, consume_progress};

use crate::{
    client::{SessionClient, body_snippet, content_type_of},
    error::*,
};
use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::{Response, StatusCode};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs::File, io::AsyncWriteExt, sync::mpsc};

/// 流式下载器。每次下载在独立任务中运行，通过有界通道报告进度。
pub struct Downloader {
    session: Arc<SessionClient>,
    buffer: usize,
}

impl Downloader {
    pub fn new(session: Arc<SessionClient>, buffer: usize) -> Self {
        Self { session, buffer }
    }

    /// 开始下载并立即返回进度接收端。
    ///
    /// 接收端恰好会收到一个终止事件 (`Completed` 或 `Failed`)，之后通道关闭。
    /// 目标文件已存在时直接覆盖。
    pub fn download(&self, url: &str, destination: &Path) -> mpsc::Receiver<DownloadProgress> {
        let (sender, rx) = ProgressSender::channel(self.buffer);
        let session = self.session.clone();
        let url = url.to_string();
        let destination = destination.to_path_buf();

        tokio::spawn(async move {
            let (sender, terminal) = run_download(&session, &url, destination, sender).await;
            sender.finish(terminal).await;
        });
        rx
    }
}

/// 执行一次下载，返回发送端和应当发出的终止事件
async fn run_download(
    session: &SessionClient,
    url: &str,
    destination: PathBuf,
    mut sender: ProgressSender,
) -> (ProgressSender, DownloadProgress) {
    info!("开始下载: {} -> {:?}", url, destination);

    let res = match checked_response(session, url).await {
        Ok(res) => res,
        Err(error) => {
            error!("下载请求被拒绝: {}", error);
            return (sender, failed(0, None, error));
        }
    };
    let final_url = res.url().to_string();
    let total_bytes = res.content_length().filter(|&len| len > 0);
    debug!("下载 '{}' 的大小: {:?}", final_url, total_bytes);

    sender.send_lossy(DownloadProgress::Started { total_bytes });

    let mut file = match File::create(&destination).await {
        Ok(file) => file,
        Err(e) => return (sender, failed(0, total_bytes, e.into())),
    };

    let mut bytes_written: u64 = 0;
    let mut stream = res.bytes_stream();
    let copy_result = async {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;
            sender.send_lossy(DownloadProgress::Advanced {
                bytes_written,
                total_bytes,
            });
        }
        file.flush().await?;
        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
    }
    .await;

    match copy_result {
        Ok(()) => {
            drop(file);
            info!("下载完成: {:?} ({} 字节)", destination, bytes_written);
            let event = DownloadProgress::Completed {
                bytes_written,
                total_bytes,
                path: destination,
            };
            (sender, event)
        }
        Err(source) => {
            // 等待未完成的写操作结束后再删除
            drop(file.into_std().await);
            warn!(
                "下载 '{}' 在写入 {} 字节后中断: {}",
                final_url, bytes_written, source
            );
            remove_partial_file(&destination).await;
            let error = AppError::DownloadInterrupted {
                bytes_written,
                source,
            };
            (sender, failed(bytes_written, total_bytes, error))
        }
    }
}

/// 发送请求并校验响应: HTML 页面和非 200 状态都视为错误，此时不会创建文件
async fn checked_response(session: &SessionClient, url: &str) -> AppResult<Response> {
    let res = session.fetch(url).await?;
    let final_url = res.url().to_string();

    if content_type_of(&res).contains("text/html") {
        let status = res.status();
        debug!(
            "下载地址返回了 HTML 页面 (状态 {}): {}",
            status,
            body_snippet(res).await
        );
        return Err(AppError::UnexpectedHtml { url: final_url });
    }

    if res.status() != StatusCode::OK {
        let status = res.status();
        return Err(AppError::HttpStatus {
            status,
            url: final_url,
            snippet: body_snippet(res).await,
        });
    }
    Ok(res)
}

async fn remove_partial_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("已删除不完整的文件: {:?}", path),
        Err(e) => warn!("删除不完整的文件 {:?} 失败: {}", path, e),
    }
}

fn failed(bytes_written: u64, total_bytes: Option<u64>, error: AppError) -> DownloadProgress {
    DownloadProgress::Failed {
        bytes_written,
        total_bytes,
        error,
    }
}
