// src/cover.rs

use crate::{client::SessionClient, error::AppResult};
use log::debug;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// 以地址为键的封面图片缓存。
///
/// 同一地址可能被并发重复获取，后写入的结果覆盖先写入的；同一地址的内容相同，
/// 因此不影响正确性。
#[derive(Default)]
pub struct CoverCache {
    entries: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl CoverCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    pub fn insert(&self, url: &str, bytes: Arc<Vec<u8>>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), bytes);
    }

    /// 先查缓存，未命中时在不持锁的情况下下载，再写入缓存
    pub async fn get_or_fetch(&self, session: &SessionClient, url: &str) -> AppResult<Arc<Vec<u8>>> {
        if let Some(bytes) = self.get(url) {
            debug!("封面缓存命中: {}", url);
            return Ok(bytes);
        }
        let bytes = Arc::new(session.fetch_image(url).await?);
        self.insert(url, bytes.clone());
        Ok(bytes)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
