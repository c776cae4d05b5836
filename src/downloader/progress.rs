// src/downloader/progress.rs

use crate::error::*;
use anyhow::anyhow;
use log::{debug, warn};
use std::path::PathBuf;
use tokio::sync::mpsc::{self, error::TrySendError};

/// 下载过程中发出的事件。`Completed` 和 `Failed` 是终止事件，每次下载恰好出现一次。
#[derive(Debug)]
pub enum DownloadProgress {
    /// 响应校验通过，开始写入文件。`total_bytes` 为 `None` 表示大小未知。
    Started { total_bytes: Option<u64> },
    Advanced {
        bytes_written: u64,
        total_bytes: Option<u64>,
    },
    Completed {
        bytes_written: u64,
        total_bytes: Option<u64>,
        path: PathBuf,
    },
    Failed {
        bytes_written: u64,
        total_bytes: Option<u64>,
        error: AppError,
    },
}

impl DownloadProgress {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    pub fn bytes_written(&self) -> u64 {
        match self {
            Self::Started { .. } => 0,
            Self::Advanced { bytes_written, .. }
            | Self::Completed { bytes_written, .. }
            | Self::Failed { bytes_written, .. } => *bytes_written,
        }
    }

    pub fn total_bytes(&self) -> Option<u64> {
        match self {
            Self::Started { total_bytes }
            | Self::Advanced { total_bytes, .. }
            | Self::Completed { total_bytes, .. }
            | Self::Failed { total_bytes, .. } => *total_bytes,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// 进度通道的发送端。
///
/// 中间事件用 `try_send` 发送，通道已满时直接丢弃；终止事件只能通过消耗
/// `self` 的 [`ProgressSender::finish`] 发送，并会等待通道出现空位。
pub struct ProgressSender {
    tx: mpsc::Sender<DownloadProgress>,
    dropped: u64,
}

impl ProgressSender {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<DownloadProgress>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx, dropped: 0 }, rx)
    }

    /// 发送中间事件，消费者跟不上时丢弃
    pub fn send_lossy(&mut self, event: DownloadProgress) {
        debug_assert!(!event.is_terminal());
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.dropped += 1,
            Err(TrySendError::Closed(_)) => {}
        }
    }

    pub async fn finish(self, event: DownloadProgress) {
        debug_assert!(event.is_terminal());
        if self.dropped > 0 {
            debug!("消费者处理过慢，丢弃了 {} 个中间进度事件", self.dropped);
        }
        if self.tx.send(event).await.is_err() {
            warn!("进度接收端已关闭，终止事件未送达");
        }
    }
}

/// 一次下载的最终结果
#[derive(Debug)]
pub struct DownloadReport {
    pub bytes_written: u64,
    pub total_bytes: Option<u64>,
    pub result: AppResult<PathBuf>,
}

/// 读取进度事件直到终止事件或通道关闭，每个事件都会交给 `on_event`
pub async fn consume_progress<F>(
    mut rx: mpsc::Receiver<DownloadProgress>,
    mut on_event: F,
) -> DownloadReport
where
    F: FnMut(&DownloadProgress),
{
    let mut report: Option<DownloadReport> = None;
    let mut last_seen = (0, None);

    while let Some(event) = rx.recv().await {
        if report.is_some() {
            warn!("忽略终止事件之后的进度事件: {:?}", event);
            continue;
        }
        on_event(&event);
        last_seen = (event.bytes_written(), event.total_bytes());
        report = match event {
            DownloadProgress::Completed {
                bytes_written,
                total_bytes,
                path,
            } => Some(DownloadReport {
                bytes_written,
                total_bytes,
                result: Ok(path),
            }),
            DownloadProgress::Failed {
                bytes_written,
                total_bytes,
                error,
            } => Some(DownloadReport {
                bytes_written,
                total_bytes,
                result: Err(error),
            }),
            _ => None,
        };
    }

    report.unwrap_or_else(|| DownloadReport {
        bytes_written: last_seen.0,
        total_bytes: last_seen.1,
        result: Err(anyhow!("下载任务在发出结果前结束").into()),
    })
}
