// tests/cli_dispatch_test.rs

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

// 使用临时主目录，避免读写真实的配置文件
fn main_command(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("HOME", home.path());
    cmd
}

#[test]
fn test_help_flag() {
    let home = tempdir().unwrap();
    main_command(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("显示此帮助信息并退出"))
        .stdout(predicate::str::contains("--search <QUERY>"));
}

#[test]
fn test_missing_mode_shows_usage() {
    let home = tempdir().unwrap();
    main_command(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_select_requires_search_mode() {
    let home = tempdir().unwrap();
    main_command(&home)
        .args(["--url", "https://example.org/book/1/a", "--select", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--select <SELECTION>"))
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_blank_search_query_is_rejected() {
    let home = tempdir().unwrap();
    main_command(&home)
        .args(["--search", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("搜索关键词不能为空"));
}

#[test]
fn test_malformed_detail_url_fails_request() {
    let home = tempdir().unwrap();
    main_command(&home)
        .args(["--url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("请求 'not a url' 失败"));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let home = tempdir().unwrap();
    main_command(&home)
        .args(["--search", "rust", "--base-url", "::not-a-base::"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("URL 解析错误"));
}

#[test]
fn test_first_run_creates_config_file() {
    let home = tempdir().unwrap();
    main_command(&home).args(["--search", " "]).assert().failure();
    let config = home.path().join(".catalog-dl").join("config.json");
    let content = std::fs::read_to_string(config).unwrap();
    assert!(content.contains("timeout_secs"));
}
