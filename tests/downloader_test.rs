// tests/downloader_test.rs

use catalog_dl::client::SessionClient;
use catalog_dl::config::AppConfig;
use catalog_dl::constants;
use catalog_dl::downloader::{DownloadProgress, Downloader};
use catalog_dl::error::AppError;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::mpsc,
};

fn downloader_for(base_url: &str) -> Downloader {
    let config = AppConfig {
        base_url: base_url.to_string(),
        ..AppConfig::default()
    };
    let buffer = config.progress_buffer;
    let session = SessionClient::new(Arc::new(config)).expect("创建客户端失败");
    Downloader::new(Arc::new(session), buffer)
}

/// 读取所有事件直到通道关闭
async fn collect(mut rx: mpsc::Receiver<DownloadProgress>) -> Vec<DownloadProgress> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1, "应当恰好有一个终止事件: {:?}", events);
    assert!(events.last().unwrap().is_terminal(), "终止事件之后不应再有事件");
    events
}

#[tokio::test]
async fn test_html_response_is_rejected_without_creating_file() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/dl/1/limit")
        .with_status(200)
        .with_header("content-type", "text/html; charset=UTF-8")
        .with_body("<html>Daily limit reached</html>")
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("book.epub");
    let base = server.url();
    let events = collect(downloader_for(&base).download(&format!("{}/dl/1/limit", base), &dest)).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0].error(),
        Some(AppError::UnexpectedHtml { url }) if url.ends_with("/dl/1/limit")
    ));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_non_200_is_rejected_without_creating_file() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/dl/2/gone")
        .with_status(404)
        .with_header("content-type", "application/octet-stream")
        .with_body("missing")
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("book.pdf");
    let base = server.url();
    let events = collect(downloader_for(&base).download(&format!("{}/dl/2/gone", base), &dest)).await;

    assert_eq!(events[0].error().and_then(|e| e.status()).map(|s| s.as_u16()), Some(404));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_large_error_body_is_cut_to_a_snippet() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/dl/6/busy")
        .with_status(503)
        .with_header("content-type", "application/octet-stream")
        .with_body("x".repeat(64 * 1024))
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("book.pdf");
    let base = server.url();
    let events = collect(downloader_for(&base).download(&format!("{}/dl/6/busy", base), &dest)).await;

    match events[0].error() {
        Some(AppError::HttpStatus { status, snippet, .. }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(snippet.len(), constants::ERROR_SNIPPET_BYTES + 3);
            assert!(snippet.ends_with("..."));
        }
        other => panic!("意外的错误: {:?}", other),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_successful_download_reports_progress() {
    let body: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/dl/3/ok")
        .with_status(200)
        .with_header("content-type", "application/epub+zip")
        .with_body(body.clone())
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("book.epub");
    // 已存在的文件会被覆盖
    std::fs::write(&dest, b"old content").unwrap();

    let base = server.url();
    let events = collect(downloader_for(&base).download(&format!("{}/dl/3/ok", base), &dest)).await;

    assert!(matches!(
        events[0],
        DownloadProgress::Started { total_bytes: Some(200_000) }
    ));
    let written: Vec<u64> = events.iter().map(|e| e.bytes_written()).collect();
    assert!(written.windows(2).all(|w| w[0] <= w[1]), "进度应单调递增");
    match events.last().unwrap() {
        DownloadProgress::Completed {
            bytes_written,
            total_bytes,
            path,
        } => {
            assert_eq!(*bytes_written, 200_000);
            assert_eq!(*total_bytes, Some(200_000));
            assert_eq!(path, &dest);
        }
        other => panic!("意外的终止事件: {:?}", other),
    }
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn test_missing_content_length_means_unknown_total() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/dl/4/chunked")
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_chunked_body(|w| std::io::Write::write_all(w, b"chunk one, chunk two"))
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("book.bin");
    let base = server.url();
    let events = collect(downloader_for(&base).download(&format!("{}/dl/4/chunked", base), &dest)).await;

    assert!(matches!(events[0], DownloadProgress::Started { total_bytes: None }));
    assert!(events.iter().all(|e| e.total_bytes().is_none()));
    assert!(matches!(
        events.last().unwrap(),
        DownloadProgress::Completed { bytes_written: 20, .. }
    ));
    assert_eq!(std::fs::read(&dest).unwrap(), b"chunk one, chunk two");
}

#[tokio::test]
async fn test_truncated_body_removes_partial_file() {
    // 声明 1000 字节，只发送 100 字节后关闭连接
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let mut request = Vec::new();
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let head = "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: 1000\r\n\r\n";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&[7u8; 100]).await.unwrap();
        socket.flush().await.unwrap();
        socket.shutdown().await.ok();
    });

    let base = format!("http://{}", addr);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("book.pdf");
    let events = collect(downloader_for(&base).download(&format!("{}/dl/5/cut", base), &dest)).await;

    assert!(matches!(events[0], DownloadProgress::Started { total_bytes: Some(1000) }));
    match events.last().unwrap() {
        DownloadProgress::Failed {
            bytes_written,
            error: AppError::DownloadInterrupted {
                bytes_written: reported,
                ..
            },
            ..
        } => {
            assert!(*bytes_written <= 100);
            assert_eq!(bytes_written, reported);
        }
        other => panic!("意外的终止事件: {:?}", other),
    }
    assert!(!dest.exists(), "不完整的文件应当被删除");
}
