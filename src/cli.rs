// src/cli.rs

use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(&["interactive", "search", "url"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 启动交互式会话: 搜索、查看详情并下载
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub interactive: bool,
    /// 按关键词搜索并列出结果
    #[arg(short, long, value_name = "QUERY", help_heading = "Mode")]
    pub search: Option<String>,
    /// 查看并下载单个详情页链接
    #[arg(long, value_name = "DETAIL_URL", help_heading = "Mode")]
    pub url: Option<String>,

    // --- 下载选项 (Options) ---
    /// [搜索模式] 下载指定的搜索结果 (例如 '1-3,5', 'all')
    #[arg(
        long,
        value_name = "SELECTION",
        requires = "search",
        conflicts_with_all = ["url", "interactive"],
        help_heading = "Options"
    )]
    pub select: Option<String>,
    /// 设置文件保存目录 (默认: ~/books)
    #[arg(short, long, value_name = "DIR", help_heading = "Options")]
    pub output: Option<PathBuf>,
    /// 覆盖已存在的文件
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub force: bool,
    /// 同时保存封面图片
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub save_cover: bool,
    /// 覆盖站点根地址
    #[arg(long, value_name = "URL", help_heading = "Options")]
    pub base_url: Option<String>,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}
