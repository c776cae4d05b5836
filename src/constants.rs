// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const FILENAME_TRUNCATE_LENGTH: usize = 65;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const FALLBACK_FILENAME: &str = "downloaded_book";
pub const DEFAULT_EXTENSION: &str = "bin";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_DIR_NAME: &str = "logs";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const DEFAULT_DOWNLOAD_DIR: &str = "books";

pub const DEFAULT_BASE_URL: &str = "https://z-library.sk";
pub const SEARCH_PATH: &str = "/s/";
pub const SEARCH_QUERY_PARAM: &str = "q";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// 错误信息中附带的响应体片段上限 (字节)
pub const ERROR_SNIPPET_BYTES: usize = 500;
/// 下载进度通道容量，中间进度在通道满时会被丢弃
pub const PROGRESS_CHANNEL_CAPACITY: usize = 16;

/// 需要服务端转换格式后才能下载的占位链接
pub const CONVERSION_SENTINEL: &str = "conversion-required";

pub mod headers {
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
    pub const ACCEPT: &str =
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";
    pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
    pub const CONNECTION: &str = "keep-alive";
    pub const DNT: &str = "1";
    pub const UPGRADE_INSECURE_REQUESTS: &str = "1";
}

/// 站点常见的电子书格式，用于从按钮文字或链接中识别格式
pub const KNOWN_FORMATS: &[&str] = &[
    "epub", "pdf", "mobi", "azw3", "fb2", "txt", "rtf", "djvu", "cbz", "cbr",
];
