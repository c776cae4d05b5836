// tests/search_extractor_test.rs

use catalog_dl::client::SessionClient;
use catalog_dl::config::AppConfig;
use catalog_dl::error::AppError;
use catalog_dl::extractor::SearchExtractor;
use catalog_dl::models::SearchResult;
use mockito::Matcher;
use std::sync::Arc;

fn extractor_for(base_url: &str) -> SearchExtractor {
    let config = AppConfig {
        base_url: base_url.to_string(),
        ..AppConfig::default()
    };
    let session = SessionClient::new(Arc::new(config)).expect("创建客户端失败");
    SearchExtractor::new(Arc::new(session))
}

fn results_page(items: &[&str]) -> String {
    let items: String = items
        .iter()
        .map(|item| format!(r#"<div class="book-item resItemBoxBooks">{}</div>"#, item))
        .collect();
    format!(
        r#"<html><body><div id="searchResultBox">{}</div></body></html>"#,
        items
    )
}

#[tokio::test]
async fn test_blank_query_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let extractor = extractor_for(&server.url());
    for query in ["", "   ", "\t\n"] {
        let err = extractor.search(query).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyQuery), "query {:?}", query);
    }
    any.assert_async().await;
}

#[tokio::test]
async fn test_query_is_trimmed_and_encoded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/s/")
        .match_query(Matcher::UrlEncoded("q".into(), "rust & go/3".into()))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(results_page(&[
            r#"<z-bookcard id="11" href="/book/11/aa"><div slot="title">Rust &amp; Go</div></z-bookcard>"#,
        ]))
        .expect(1)
        .create_async()
        .await;

    let base = server.url();
    let outcome = extractor_for(&base)
        .search("  rust & go/3  ")
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(!outcome.is_partial());
    assert_eq!(
        outcome.results,
        vec![SearchResult {
            title: "Rust & Go".into(),
            url: format!("{}/book/11/aa", base),
            book_id: Some("11".into()),
        }]
    );
}

#[tokio::test]
async fn test_malformed_cards_are_reported_as_partial_success() {
    let mut server = mockito::Server::new_async().await;
    let page = results_page(&[
        r#"<z-bookcard id="1" href="/book/1/a"><div slot="title">First</div></z-bookcard>"#,
        r#"<z-bookcard id="2"><div slot="title">No link</div></z-bookcard>"#,
        r#"<h3 itemprop="name"><a href="/book/3/c">Third</a></h3>"#,
        r#"<p>nothing useful here</p>"#,
        r#"<z-bookcard id="5" href="/book/5/e"></z-bookcard>"#,
    ]);
    server
        .mock("GET", "/s/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(page)
        .create_async()
        .await;

    let outcome = extractor_for(&server.url()).search("books").await.unwrap();

    // 3 个有效条目，2 个无效条目
    let titles: Vec<&str> = outcome.results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Third", "Title N/A"]);
    assert!(outcome.is_partial());
    let issues = outcome.issues.unwrap();
    assert_eq!(issues.count(), 2);
    assert!(issues.to_string().contains("2 个错误"));
}

#[tokio::test]
async fn test_non_200_returns_status_and_snippet() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/s/")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("Service busy, try later")
        .create_async()
        .await;

    let err = extractor_for(&server.url())
        .search("anything")
        .await
        .unwrap_err();
    match err {
        AppError::HttpStatus {
            status,
            url,
            snippet,
        } => {
            assert_eq!(status.as_u16(), 503);
            assert!(url.contains("/s/?q=anything"));
            assert_eq!(snippet, "Service busy, try later");
        }
        other => panic!("意外的错误: {:?}", other),
    }
}

#[tokio::test]
async fn test_links_resolve_against_redirected_url() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/s/")
        .match_query(Matcher::Any)
        .with_status(302)
        .with_header("location", "/mirror/results?q=x")
        .create_async()
        .await;
    server
        .mock("GET", "/mirror/results")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(results_page(&[
            r#"<h3 itemprop="name"><a href="details/42">Relative</a></h3>"#,
        ]))
        .create_async()
        .await;

    let base = server.url();
    let outcome = extractor_for(&base).search("x").await.unwrap();
    assert_eq!(outcome.final_url, format!("{}/mirror/results?q=x", base));
    assert_eq!(outcome.results[0].url, format!("{}/mirror/details/42", base));
    assert_eq!(outcome.results[0].book_id, None);
}
