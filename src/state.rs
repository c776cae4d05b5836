// src/state.rs

use crate::{error::ExtractionIssues, models::{BookDetails, SearchResult}};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::Notify;

/// 后台请求的序号。新请求开始后，旧序号的结果会被丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DownloadView {
    #[default]
    Idle,
    Running {
        bytes_written: u64,
        total_bytes: Option<u64>,
    },
    Finished {
        bytes_written: u64,
        error: Option<String>,
    },
}

/// 前台展示用的状态快照
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub status: String,
    pub search_loading: bool,
    pub results: Vec<SearchResult>,
    pub search_issues: Option<ExtractionIssues>,
    pub search_error: Option<String>,
    pub details_loading: bool,
    pub details: Option<BookDetails>,
    pub details_issues: Option<ExtractionIssues>,
    pub details_error: Option<String>,
    /// 封面正在获取中
    pub cover_loading: bool,
    pub cover: Option<Arc<Vec<u8>>>,
    pub download: DownloadView,
}

/// 后台任务与前台之间共享的状态。
///
/// 每次修改后都会触发一次变更通知；前台未及时处理时，多个通知合并为一个。
#[derive(Default)]
pub struct SharedState {
    view: Mutex<ViewState>,
    changed: Notify,
    search_seq: AtomicU64,
    details_seq: AtomicU64,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let result = f(&mut self.lock());
        self.changed.notify_one();
        result
    }

    pub fn snapshot(&self) -> ViewState {
        self.lock().clone()
    }

    pub fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        self.update(|view| view.status = status);
    }

    /// 开始新的搜索，清空旧的结果和详情
    pub fn begin_search(&self) -> Ticket {
        let ticket = Ticket(self.search_seq.fetch_add(1, Ordering::SeqCst) + 1);
        // 新搜索同时让进行中的详情请求失效
        self.details_seq.fetch_add(1, Ordering::SeqCst);
        self.update(|view| {
            view.search_loading = true;
            view.results.clear();
            view.search_issues = None;
            view.search_error = None;
            view.details_loading = false;
            view.details = None;
            view.details_issues = None;
            view.details_error = None;
            view.cover_loading = false;
            view.cover = None;
        });
        ticket
    }

    /// 写入搜索结果。返回 `false` 表示结果已过期并被丢弃。
    pub fn complete_search(
        &self,
        ticket: Ticket,
        outcome: Result<(Vec<SearchResult>, Option<ExtractionIssues>), String>,
    ) -> bool {
        self.update(|view| {
            if ticket.0 != self.search_seq.load(Ordering::SeqCst) {
                return false;
            }
            view.search_loading = false;
            match outcome {
                Ok((results, issues)) => {
                    view.results = results;
                    view.search_issues = issues;
                }
                Err(e) => view.search_error = Some(e),
            }
            true
        })
    }

    pub fn begin_details(&self) -> Ticket {
        let ticket = Ticket(self.details_seq.fetch_add(1, Ordering::SeqCst) + 1);
        self.update(|view| {
            view.details_loading = true;
            view.details = None;
            view.details_issues = None;
            view.details_error = None;
            view.cover_loading = false;
            view.cover = None;
        });
        ticket
    }

    pub fn complete_details(
        &self,
        ticket: Ticket,
        outcome: Result<(BookDetails, Option<ExtractionIssues>), String>,
    ) -> bool {
        self.update(|view| {
            if ticket.0 != self.details_seq.load(Ordering::SeqCst) {
                return false;
            }
            view.details_loading = false;
            match outcome {
                Ok((details, issues)) => {
                    view.cover_loading = details.cover_url.is_some();
                    view.details = Some(details);
                    view.details_issues = issues;
                }
                Err(e) => view.details_error = Some(e),
            }
            true
        })
    }

    /// 写入封面获取结果，`None` 表示获取失败。只接受当前详情请求的封面。
    pub fn set_cover(&self, ticket: Ticket, cover: Option<Arc<Vec<u8>>>) -> bool {
        self.update(|view| {
            if ticket.0 != self.details_seq.load(Ordering::SeqCst) {
                return false;
            }
            view.cover_loading = false;
            view.cover = cover;
            true
        })
    }

    pub fn update_download(&self, download: DownloadView) {
        self.update(|view| view.download = download);
    }

    /// 等待下一次变更通知
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    /// 等待直到快照满足条件
    pub async fn wait_for<F>(&self, mut pred: F) -> ViewState
    where
        F: FnMut(&ViewState) -> bool,
    {
        loop {
            let notified = self.changed.notified();
            let view = self.snapshot();
            if pred(&view) {
                return view;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(title: &str) -> SearchResult {
        SearchResult {
            title: title.into(),
            url: format!("https://example.org/book/{}", title),
            book_id: None,
        }
    }

    #[test]
    fn test_stale_search_results_are_discarded() {
        let state = SharedState::new();
        let first = state.begin_search();
        let second = state.begin_search();

        assert!(state.complete_search(second, Ok((vec![result("new")], None))));
        // 较早的请求后返回，不能覆盖当前结果
        assert!(!state.complete_search(first, Ok((vec![result("old")], None))));

        let view = state.snapshot();
        assert_eq!(view.results, vec![result("new")]);
        assert!(!view.search_loading);
    }

    #[test]
    fn test_new_search_invalidates_pending_details() {
        let state = SharedState::new();
        let details_ticket = state.begin_details();
        state.begin_search();

        assert!(!state.complete_details(details_ticket, Ok((BookDetails::default(), None))));
        assert!(!state.set_cover(details_ticket, Some(Arc::new(vec![1, 2, 3]))));
        assert!(state.snapshot().details.is_none());
    }

    #[tokio::test]
    async fn test_notifications_are_coalesced() {
        let state = Arc::new(SharedState::new());
        state.set_status("一");
        state.set_status("二");
        state.set_status("三");

        // 多次修改只留下一个待处理的通知
        tokio::time::timeout(Duration::from_millis(100), state.changed())
            .await
            .unwrap();
        assert!(
            tokio::time::timeout(Duration::from_millis(50), state.changed())
                .await
                .is_err()
        );
        assert_eq!(state.snapshot().status, "三");
    }

    #[tokio::test]
    async fn test_wait_for_background_update() {
        let state = Arc::new(SharedState::new());
        let ticket = state.begin_search();

        let worker = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            worker.complete_search(ticket, Err("超时".into()));
        });

        let view = state.wait_for(|v| !v.search_loading).await;
        assert_eq!(view.search_error.as_deref(), Some("超时"));
    }

    #[tokio::test]
    async fn test_cover_loading_tracks_cover_fetch() {
        let state = Arc::new(SharedState::new());
        let ticket = state.begin_details();
        let details = BookDetails {
            cover_url: Some("https://example.org/covers300/a.jpg".into()),
            ..Default::default()
        };
        assert!(state.complete_details(ticket, Ok((details, None))));
        assert!(state.snapshot().cover_loading);

        let worker = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            worker.set_cover(ticket, Some(Arc::new(vec![0xFF, 0xD8])));
        });
        let view = state.wait_for(|v| !v.cover_loading).await;
        assert_eq!(view.cover.as_deref(), Some(&vec![0xFF, 0xD8]));

        // 获取失败同样结束加载状态
        let ticket = state.begin_details();
        let details = BookDetails {
            cover_url: Some("https://example.org/covers300/b.jpg".into()),
            ..Default::default()
        };
        state.complete_details(ticket, Ok((details, None)));
        assert!(state.set_cover(ticket, None));
        let view = state.snapshot();
        assert!(!view.cover_loading);
        assert!(view.cover.is_none());

        // 没有封面地址时不进入加载状态
        let ticket = state.begin_details();
        state.complete_details(ticket, Ok((BookDetails::default(), None)));
        assert!(!state.snapshot().cover_loading);
    }
}
