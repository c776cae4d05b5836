// src/ui.rs

use crate::{
    constants,
    models::{BookDetails, SearchResult},
    utils,
};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use std::{
    io::{self, Write},
    time::Duration,
};

pub mod symbols {
    use colored::{ColoredString, Colorize};
    use std::sync::LazyLock;

    pub static OK: LazyLock<ColoredString> = LazyLock::new(|| "[OK]".green());
    pub static ERROR: LazyLock<ColoredString> = LazyLock::new(|| "[X]".red());
    pub static INFO: LazyLock<ColoredString> = LazyLock::new(|| "[i]".cyan());
    pub static WARN: LazyLock<ColoredString> = LazyLock::new(|| "[!]".yellow());
    pub static CTRL_C: LazyLock<ColoredString> = LazyLock::new(|| "Ctrl+C".yellow());
}

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

pub fn plain(message: &str) {
    println!("{}", message);
}

pub fn info(message: &str) {
    println!("{} {}", *symbols::INFO, message);
}

pub fn ok(message: &str) {
    println!("{} {}", *symbols::OK, message.green());
}

pub fn warn(message: &str) {
    println!("{} {}", *symbols::WARN, message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", *symbols::ERROR, message.red());
}

pub fn box_message(title: &str, content: &[&str], color_func: fn(ColoredString) -> ColoredString) {
    println!("\n┌{}┐", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {}", color_func(title.bold()));
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));
    for line in content {
        println!("  {}", line);
    }
    println!("└{}┘", "─".repeat(constants::UI_WIDTH - 2));
}

pub fn prompt(message: &str, default: Option<&str>) -> io::Result<String> {
    let default_str = default
        .filter(|d| !d.is_empty())
        .map_or("".to_string(), |d| format!(" (默认: {})", d));
    print!("\n>>> {}{}: ", message, default_str);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_string();
    if input.is_empty() {
        Ok(default.unwrap_or("").to_string())
    } else {
        Ok(input)
    }
}

pub fn confirm(question: &str, default_yes: bool) -> bool {
    let options = if default_yes { "(Y/n)" } else { "(y/N)" };
    loop {
        match prompt(
            &format!("{} {} (按 {} 取消)", question, options, *symbols::CTRL_C),
            None,
        ) {
            Ok(choice) => match choice.to_lowercase().as_str() {
                "y" => return true,
                "n" => return false,
                "" => return default_yes,
                _ => println!("{}", "无效输入，请输入 'y' 或 'n'。".red()),
            },
            Err(_) => return false,
        }
    }
}

pub fn selection_menu(
    options: &[String],
    title: &str,
    instructions: &str,
    default_choice: &str,
) -> String {
    println!("\n┌{}┐", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {}", title.cyan().bold());
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));
    print_numbered(options);
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {} (按 {} 可取消)", instructions, *symbols::CTRL_C);
    println!("└{}┘", "─".repeat(constants::UI_WIDTH - 2));

    prompt("请输入你的选择", Some(default_choice)).unwrap_or_default()
}

fn print_numbered(options: &[String]) {
    let pad = options.len().to_string().len();
    for (i, option) in options.iter().enumerate() {
        println!(
            "  [{}] {}",
            format!("{:<pad$}", i + 1, pad = pad).yellow(),
            option
        );
    }
}

/// 搜索结果的单行描述
pub fn result_line(result: &SearchResult) -> String {
    let title = utils::truncate_text(&result.title, constants::FILENAME_TRUNCATE_LENGTH);
    match &result.book_id {
        Some(id) => format!("{} {}", title, format!("(#{})", id).dimmed()),
        None => title,
    }
}

pub fn print_results(results: &[SearchResult]) {
    let lines: Vec<String> = results.iter().map(result_line).collect();
    println!();
    print_numbered(&lines);
}

/// 详情信息框中的各行，只包含页面上找到的字段
pub fn details_lines(details: &BookDetails) -> Vec<String> {
    let mut lines = Vec::new();
    let mut push = |label: &str, value: Option<&str>| {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            lines.push(format!("{:<10} {}", format!("{}:", label), value));
        }
    };

    push("作者", details.author.as_deref());
    push("编号", details.book_id.as_deref());
    push("类型", details.content_type.as_deref());
    push("出版社", details.publisher.as_deref());
    push("年份", details.year.as_deref());
    push("卷", details.volume.as_deref());
    push("系列", details.series.as_deref());
    push("语言", details.language.as_deref());
    push("ISBN 10", details.isbn_10.as_deref());
    push("ISBN 13", details.isbn_13.as_deref());
    push("评分", details.rating_interest.as_deref());
    push("质量", details.rating_quality.as_deref());
    push("IPFS CID", details.ipfs_cid.as_deref());
    push("封面", details.cover_url.as_deref());

    if !details.categories.is_empty() {
        let names = details.categories.iter().map(|c| &c.name).join(" / ");
        lines.push(format!("{:<10} {}", "分类:", names));
    }
    if !details.other_formats.is_empty() {
        let formats = details
            .other_formats
            .iter()
            .map(|f| {
                if f.link.is_conversion_required() {
                    format!("{} (需转换)", f.format)
                } else {
                    f.format.clone()
                }
            })
            .join(", ");
        lines.push(format!("{:<10} {}", "其他格式:", formats));
    }
    if let Some(description) = details.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(String::new());
        lines.push(utils::truncate_text(
            &description.split_whitespace().join(" "),
            constants::UI_WIDTH - 4,
        ));
    }
    lines.push(String::new());
    lines.push(details.download_label());
    lines
}

pub fn print_book_details(details: &BookDetails) {
    let title = details.title.as_deref().unwrap_or(constants::UNKNOWN_TITLE);
    let lines = details_lines(details);
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    box_message(title, &refs, |s| s.cyan());
}

/// 下载进度条；大小未知时显示为不确定进度的计数器
pub fn new_download_progress_bar(total_bytes: Option<u64>) -> ProgressBar {
    match total_bytes {
        Some(total) => {
            let style = ProgressStyle::with_template(
                "{prefix:7.bold.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) [ETA: {eta}]",
            )
            .expect("进度条模板无效")
            .progress_chars("#>-");
            let pbar = ProgressBar::new(total);
            pbar.set_style(style);
            pbar.set_prefix("下载中");
            pbar
        }
        None => {
            let pbar = new_spinner("下载中 (大小未知)");
            pbar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg} {bytes} ({bytes_per_sec})")
                    .expect("进度条模板无效"),
            );
            pbar
        }
    }
}

pub fn new_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}").expect("进度条模板无效"),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
