// src/workflows.rs

use crate::{
    AppContext,
    downloader::{DownloadProgress, Downloader, consume_progress},
    error::{AppError, AppResult, ExtractionIssues},
    extractor::{DetailExtractor, SearchExtractor},
    models::{BookDetails, SearchResult},
    state::DownloadView,
    ui::{self, symbols},
    utils,
};
use anyhow::anyhow;
use colored::*;
use indicatif::ProgressBar;
use log::{debug, error, info, warn};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use url::Url;

/// 运行搜索模式 (处理 --search，可选 --select)
pub(crate) async fn run_search(
    context: AppContext,
    query: &str,
    selection: Option<&str>,
) -> AppResult<()> {
    let spinner = ui::new_spinner(&format!("正在搜索 '{}'...", query.trim()));
    let outcome = SearchExtractor::new(context.session.clone())
        .search(query)
        .await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    report_issues("部分搜索结果解析失败", outcome.issues.as_ref());
    if outcome.results.is_empty() {
        ui::warn("没有找到任何结果。");
        return Ok(());
    }

    ui::print_header(&format!("搜索结果 (共 {} 项)", outcome.results.len()));
    ui::print_results(&outcome.results);

    let Some(selection) = selection else {
        return Ok(());
    };
    let indices = utils::parse_selection_indices(selection, outcome.results.len());
    if indices.is_empty() {
        return Err(AppError::UserInputError(format!(
            "选择 '{}' 没有匹配任何结果。",
            selection
        )));
    }

    let total = indices.len();
    let mut failed = 0;
    for (n, index) in indices.into_iter().enumerate() {
        let result = &outcome.results[index];
        ui::print_sub_header(&format!(
            "任务 {}/{} - {}",
            n + 1,
            total,
            utils::truncate_text(&result.title, 60)
        ));
        if let Err(e) = process_book(&context, &result.url, false).await {
            failed += 1;
            error!("下载 '{}' 失败: {}", result.url, e);
            ui::error(&describe_error(&e));
        }
    }

    ui::print_header("下载报告");
    println!(
        "{} | {} | 总计: {}",
        format!("成功: {}", total - failed).green(),
        format!("失败: {}", failed).red(),
        total
    );
    if failed > 0 {
        Err(AppError::Other(anyhow!("{} 个下载任务失败。", failed)))
    } else {
        Ok(())
    }
}

/// 运行单本模式 (处理 --url)
pub(crate) async fn run_single_book(context: AppContext, url: &str) -> AppResult<()> {
    process_book(&context, url, false).await.map(drop)
}

/// 获取详情、展示并下载一本书。返回保存的路径，跳过时为 `None`。
async fn process_book(
    context: &AppContext,
    url: &str,
    interactive: bool,
) -> AppResult<Option<PathBuf>> {
    let spinner = ui::new_spinner("正在获取详情...");
    let outcome = DetailExtractor::new(context.session.clone())
        .fetch_details(url)
        .await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    ui::print_book_details(&outcome.details);
    report_issues("详情页解析时遇到问题", outcome.issues.as_ref());
    download_book(context, &outcome.details, interactive).await
}

/// 按覆盖策略下载主文件: 交互模式询问用户，非交互模式只在 --force 时覆盖
async fn download_book(
    context: &AppContext,
    details: &BookDetails,
    interactive: bool,
) -> AppResult<Option<PathBuf>> {
    let Some(url) = details.download_url.as_deref() else {
        return Err(AppError::UserInputError(format!(
            "没有可以直接下载的链接 ({})。",
            details.download_label()
        )));
    };

    tokio::fs::create_dir_all(&context.config.download_dir).await?;
    let download_dir = dunce::canonicalize(&context.config.download_dir)?;
    let path = download_dir.join(utils::book_filename(details));

    if path.exists() {
        let overwrite = if interactive {
            ui::confirm(
                &format!("文件 '{}' 已存在，是否覆盖?", path.display()),
                false,
            )
        } else {
            context.args.force
        };
        if !overwrite {
            info!("跳过已存在的文件: {:?}", path);
            ui::warn(&format!("文件已存在，已跳过: {}", path.display()));
            return Ok(None);
        }
        info!("覆盖已存在的文件: {:?}", path);
    }

    let saved = run_download(context, url, &path).await?;
    if context.args.save_cover
        && let Some(cover_url) = details.cover_url.as_deref()
    {
        if let Err(e) = save_cover(context, cover_url, &saved).await {
            warn!("保存封面失败: {}", e);
            ui::warn(&format!("封面保存失败: {}", e));
        }
    }
    Ok(Some(saved))
}

/// 启动下载任务，并在独立的消费任务中更新进度条和共享状态
async fn run_download(context: &AppContext, url: &str, path: &Path) -> AppResult<PathBuf> {
    let downloader = Downloader::new(context.session.clone(), context.config.progress_buffer);
    let rx = downloader.download(url, path);

    let state = context.state.clone();
    let consumer = tokio::spawn(async move {
        let mut pbar: Option<ProgressBar> = None;
        let report = consume_progress(rx, |event| {
            match event {
                DownloadProgress::Started { total_bytes } => {
                    pbar = Some(ui::new_download_progress_bar(*total_bytes));
                }
                DownloadProgress::Advanced { bytes_written, .. } => {
                    if let Some(pbar) = &pbar {
                        pbar.set_position(*bytes_written);
                    }
                }
                _ => {}
            }
            state.update_download(DownloadView::Running {
                bytes_written: event.bytes_written(),
                total_bytes: event.total_bytes(),
            });
        })
        .await;

        if let Some(pbar) = pbar {
            pbar.set_position(report.bytes_written);
            match &report.result {
                Ok(_) => pbar.finish_and_clear(),
                Err(_) => pbar.abandon(),
            }
        }
        state.update_download(DownloadView::Finished {
            bytes_written: report.bytes_written,
            error: report.result.as_ref().err().map(|e| e.to_string()),
        });
        report
    });

    let report = consumer
        .await
        .map_err(|e| AppError::Other(anyhow!("进度任务异常退出: {}", e)))?;
    let saved = report.result?;
    ui::ok(&format!(
        "下载完成: {} ({})",
        saved.display(),
        utils::format_bytes(report.bytes_written)
    ));
    Ok(saved)
}

/// 把封面保存在书籍文件旁，文件名相同，扩展名取自封面地址
async fn save_cover(context: &AppContext, cover_url: &str, book_path: &Path) -> AppResult<PathBuf> {
    let bytes = context.covers.get_or_fetch(&context.session, cover_url).await?;
    let ext = Url::parse(cover_url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
        })
        .filter(|e| matches!(e.as_str(), "jpg" | "jpeg" | "png" | "webp" | "gif"))
        .unwrap_or_else(|| "jpg".to_string());
    let cover_path = book_path.with_extension(ext);
    tokio::fs::write(&cover_path, bytes.as_slice()).await?;
    debug!("封面已保存: {:?}", cover_path);
    ui::info(&format!("封面已保存: {}", cover_path.display()));
    Ok(cover_path)
}

/// 运行交互模式
pub(crate) async fn run_interactive(context: AppContext) -> AppResult<()> {
    ui::print_header("交互模式");
    ui::plain(&format!(
        "输入关键词搜索书籍，选择结果查看详情并下载。输入空行或按 {} 可随时退出。",
        *symbols::CTRL_C
    ));

    loop {
        let query = match ui::prompt("请输入搜索关键词", None) {
            Ok(input) if !input.is_empty() => input,
            Ok(_) => break,
            Err(_) => return Err(AppError::UserInterrupt),
        };

        let results = match interactive_search(&context, &query).await {
            Some(results) => results,
            None => continue,
        };

        let options: Vec<String> = results.iter().map(ui::result_line).collect();
        let choice = ui::selection_menu(
            &options,
            &format!("'{}' 的搜索结果", query),
            "请输入序号查看详情 (直接按回车返回搜索)",
            "",
        );
        if choice.is_empty() {
            continue;
        }
        let Some(&index) = utils::parse_selection_indices(&choice, results.len()).first() else {
            ui::warn(&format!("无效的选择 '{}'。", choice));
            continue;
        };

        let Some(details) = interactive_details(&context, &results[index]).await else {
            continue;
        };
        if details.download_url.is_none() {
            ui::warn(&format!("这本书没有可以直接下载的链接 ({})。", details.download_label()));
            continue;
        }
        if !ui::confirm("是否下载这本书?", true) {
            continue;
        }
        if let Err(e) = download_book(&context, &details, true).await {
            error!("交互模式下载失败: {}", e);
            ui::error(&describe_error(&e));
        }
    }

    ui::plain("");
    ui::info("退出交互模式。");
    Ok(())
}

/// 在后台任务中搜索，前台等待共享状态更新
async fn interactive_search(context: &AppContext, query: &str) -> Option<Vec<SearchResult>> {
    let state = context.state.clone();
    let ticket = state.begin_search();

    let session = context.session.clone();
    let worker_state = state.clone();
    let query_owned = query.to_string();
    tokio::spawn(async move {
        worker_state.set_status(format!("正在搜索 '{}'...", query_owned));
        let outcome = SearchExtractor::new(session)
            .search(&query_owned)
            .await
            .map(|o| (o.results, o.issues))
            .map_err(|e| describe_error(&e));
        if !worker_state.complete_search(ticket, outcome) {
            debug!("丢弃过期的搜索结果: '{}'", query_owned);
        }
    });

    let spinner = ui::new_spinner(&format!("正在搜索 '{}'...", query));
    let view = state.wait_for(|v| !v.search_loading).await;
    spinner.finish_and_clear();

    if let Some(e) = view.search_error {
        ui::error(&e);
        return None;
    }
    report_issues("部分搜索结果解析失败", view.search_issues.as_ref());
    if view.results.is_empty() {
        ui::warn("没有找到任何结果。");
        return None;
    }
    Some(view.results)
}

/// 在后台任务中获取详情，封面与之并发获取
async fn interactive_details(context: &AppContext, result: &SearchResult) -> Option<BookDetails> {
    let state = context.state.clone();
    let ticket = state.begin_details();

    let session = context.session.clone();
    let covers = context.covers.clone();
    let worker_state = state.clone();
    let url = result.url.clone();
    tokio::spawn(async move {
        let outcome = DetailExtractor::new(session.clone()).fetch_details(&url).await;
        let cover_url = outcome
            .as_ref()
            .ok()
            .and_then(|o| o.details.cover_url.clone());
        let accepted = worker_state.complete_details(
            ticket,
            outcome
                .map(|o| (o.details, o.issues))
                .map_err(|e| describe_error(&e)),
        );
        if !accepted {
            debug!("丢弃过期的详情: {}", url);
            return;
        }
        if let Some(cover_url) = cover_url {
            tokio::spawn(async move {
                let cover = match covers.get_or_fetch(&session, &cover_url).await {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        warn!("获取封面 '{}' 失败: {}", cover_url, e);
                        None
                    }
                };
                worker_state.set_cover(ticket, cover);
            });
        }
    });

    let spinner = ui::new_spinner("正在获取详情...");
    let view = state.wait_for(|v| !v.details_loading).await;
    spinner.finish_and_clear();

    if let Some(e) = view.details_error {
        ui::error(&e);
        return None;
    }
    let details = view.details?;
    ui::print_book_details(&details);
    report_issues("详情页解析时遇到问题", view.details_issues.as_ref());
    let cover = if view.cover_loading {
        let spinner = ui::new_spinner("正在加载封面...");
        let view = state.wait_for(|v| !v.cover_loading).await;
        spinner.finish_and_clear();
        view.cover
    } else {
        view.cover
    };
    match cover {
        Some(cover) => ui::info(&format!("封面已加载 ({})", utils::format_bytes(cover.len() as u64))),
        None if details.cover_url.is_some() => ui::warn("封面加载失败。"),
        None => {}
    }
    Some(details)
}

fn report_issues(title: &str, issues: Option<&ExtractionIssues>) {
    if let Some(issues) = issues {
        ui::warn(&format!("{} ({} 项):", title, issues.count()));
        for message in issues.messages() {
            ui::plain(&format!("    - {}", message));
        }
    }
}

/// 面向用户的错误描述
fn describe_error(e: &AppError) -> String {
    match e {
        _ if e.is_timeout() => "请求超时，请稍后重试。".to_string(),
        AppError::HttpStatus { status, url, .. }
            if *status == StatusCode::NOT_FOUND || *status == StatusCode::FORBIDDEN =>
        {
            format!("资源不存在或无权访问 ({}): {}", status, url)
        }
        AppError::HttpStatus { status, url, .. } => {
            format!("服务器返回了一个错误: {} ({})", status, url)
        }
        AppError::RequestFailed { url, .. } => format!("网络连接错误: {}", url),
        _ => e.to_string(),
    }
}
