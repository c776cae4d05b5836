// src/lib.rs

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod cover;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod models;
pub mod state;
pub mod ui;
pub mod utils;
mod workflows;

use crate::{
    cli::Cli,
    client::SessionClient,
    config::AppConfig,
    cover::CoverCache,
    error::AppResult,
    state::SharedState,
};
use log::debug;
use std::sync::Arc;

/// 各个流程共享的运行上下文
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub session: Arc<SessionClient>,
    pub covers: Arc<CoverCache>,
    pub state: Arc<SharedState>,
    pub args: Arc<Cli>,
}

impl AppContext {
    pub fn new(config: Arc<AppConfig>, args: Arc<Cli>) -> AppResult<Self> {
        let session = Arc::new(SessionClient::new(config.clone())?);
        Ok(Self {
            config,
            session,
            covers: Arc::new(CoverCache::new()),
            state: Arc::new(SharedState::new()),
            args,
        })
    }
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);

    let context = AppContext::new(config, args.clone())?;

    if args.interactive {
        workflows::run_interactive(context).await
    } else if let Some(query) = &args.search {
        workflows::run_search(context, query, args.select.as_deref()).await
    } else if let Some(url) = &args.url {
        workflows::run_single_book(context, url).await
    } else {
        Ok(())
    }
}
