// src/config.rs

pub mod file;

use self::file::load_or_create_external_config;
use crate::{cli::Cli, constants, error::AppResult};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        Self {
            network: NetworkConfig {
                base_url: Some(constants::DEFAULT_BASE_URL.into()),
                timeout_secs: Some(constants::DEFAULT_TIMEOUT_SECS),
            },
            download_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub download_dir: PathBuf,
    pub progress_buffer: usize,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;

        let base_url = args
            .base_url
            .clone()
            .or(external_config.network.base_url)
            .unwrap_or_else(|| constants::DEFAULT_BASE_URL.into());
        url::Url::parse(&base_url)?;

        let download_dir = match args.output.clone().or(external_config.download_dir) {
            Some(dir) => dir,
            None => default_download_dir()?,
        };

        Ok(Self {
            base_url,
            user_agent: constants::headers::USER_AGENT.into(),
            timeout: Duration::from_secs(
                external_config
                    .network
                    .timeout_secs
                    .unwrap_or(constants::DEFAULT_TIMEOUT_SECS),
            ),
            download_dir,
            progress_buffer: constants::PROGRESS_CHANNEL_CAPACITY,
        })
    }
}

/// 默认下载目录: 用户主目录下的 `books`
pub fn default_download_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("无法获取用户主目录"))?;
    Ok(home.join(constants::DEFAULT_DOWNLOAD_DIR))
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_BASE_URL.to_string(),
            user_agent: "test-agent/1.0".to_string(),
            timeout: Duration::from_secs(15),
            download_dir: std::env::temp_dir().join(constants::DEFAULT_DOWNLOAD_DIR),
            progress_buffer: constants::PROGRESS_CHANNEL_CAPACITY,
        }
    }
}
