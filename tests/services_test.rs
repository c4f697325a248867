//! Tests for the search, link and document services against mock upstreams

use mockito::{Matcher, Server};
use plugin_apis::config::GoogleSearchConfig;
use plugin_apis::services::link_reader::BROWSER_USER_AGENT;
use plugin_apis::services::{FileReader, GoogleSearchClient, LinkReader, ReaderError};

fn google_client(endpoint: String) -> GoogleSearchClient {
    GoogleSearchClient::new(
        reqwest::Client::new(),
        &GoogleSearchConfig {
            api_key: Some("key".to_string()),
            search_engine_id: Some("engine".to_string()),
            http_proxy: None,
            endpoint,
        },
    )
}

#[tokio::test]
async fn test_google_search_shifts_start_and_maps_items() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/customsearch/v1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("key".into(), "key".into()),
            Matcher::UrlEncoded("cx".into(), "engine".into()),
            Matcher::UrlEncoded("q".into(), "rust axum".into()),
            Matcher::UrlEncoded("start".into(), "11".into()),
            Matcher::UrlEncoded("num".into(), "2".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"kind": "customsearch#search", "items": [
              {"title": "Axum", "link": "https://docs.rs/axum", "snippet": "web framework", "displayLink": "docs.rs"},
              {"title": "No snippet", "link": "https://example.com"}
            ]}"#,
        )
        .create_async()
        .await;

    let client = google_client(format!("{}/customsearch/v1", server.url()));
    let results = client.search("rust axum", 2, 10).await.unwrap();

    mock.assert_async().await;
    assert_eq!(results.items.len(), 2);
    assert_eq!(results.items[0].title, "Axum");
    assert_eq!(results.items[0].link, "https://docs.rs/axum");
    assert_eq!(results.items[0].snippet, "web framework");
    assert_eq!(results.items[1].snippet, "");
}

#[tokio::test]
async fn test_google_search_without_results() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/customsearch/v1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"searchInformation": {"totalResults": "0"}}"#)
        .create_async()
        .await;

    let client = google_client(format!("{}/customsearch/v1", server.url()));
    let results = client.search("nothing", 3, 0).await.unwrap();
    assert!(results.items.is_empty());
}

#[tokio::test]
async fn test_google_search_upstream_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/customsearch/v1")
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let client = google_client(format!("{}/customsearch/v1", server.url()));
    let err = client.search("rust", 3, 0).await.unwrap_err();
    assert!(matches!(err, ReaderError::Upstream { status: 403, .. }));
}

#[tokio::test]
async fn test_google_search_unexpected_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/customsearch/v1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = google_client(format!("{}/customsearch/v1", server.url()));
    let err = client.search("rust", 3, 0).await.unwrap_err();
    assert!(matches!(err, ReaderError::Decode { .. }));
    assert_eq!(err.kind(), "DecodeError");
}

#[tokio::test]
async fn test_read_link_raw_sends_browser_agent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/page")
        .match_header("user-agent", BROWSER_USER_AGENT)
        .with_status(200)
        .with_body("<p>raw</p>")
        .create_async()
        .await;

    let reader = LinkReader::new(reqwest::Client::new());
    let raw = reader
        .read_link_raw(&format!("{}/page", server.url()))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(raw, "<p>raw</p>");
}

#[tokio::test]
async fn test_read_link_text_strips_markup() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/article")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(
            "<html><head><script>track()</script></head>\
             <body><h1> News </h1><p>Rust &amp; you</p></body></html>",
        )
        .create_async()
        .await;

    let reader = LinkReader::new(reqwest::Client::new());
    let text = reader
        .read_link_text(&format!("{}/article", server.url()))
        .await
        .unwrap();
    assert_eq!(text, "NewsRust & you");
}

#[tokio::test]
async fn test_read_link_text_keeps_error_bodies() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/err")
        .with_status(200)
        .with_body("Error: <b>quota</b>")
        .create_async()
        .await;

    let reader = LinkReader::new(reqwest::Client::new());
    let text = reader
        .read_link_text(&format!("{}/err", server.url()))
        .await
        .unwrap();
    assert_eq!(text, "Error: <b>quota</b>");
}

#[tokio::test]
async fn test_read_link_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/gone")
        .with_status(404)
        .create_async()
        .await;

    let reader = LinkReader::new(reqwest::Client::new());
    let err = reader
        .read_link_raw(&format!("{}/gone", server.url()))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("404 error for url:"));
}

#[tokio::test]
async fn test_read_text_file() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/notes.txt")
        .with_status(200)
        .with_body("line one\nline two")
        .create_async()
        .await;

    let reader = FileReader::new(reqwest::Client::new());
    let text = reader
        .read_file(&format!("{}/notes.txt", server.url()), ".txt")
        .await
        .unwrap();
    assert_eq!(text, "line one\nline two");
}

#[tokio::test]
async fn test_read_file_rejects_unknown_type_without_fetching() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/slides.pptx")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let reader = FileReader::new(reqwest::Client::new());
    let err = reader
        .read_file(&format!("{}/slides.pptx", server.url()), ".pptx")
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.to_string(), "Unsupported file type: .pptx");
}

#[tokio::test]
async fn test_read_corrupt_document() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/report.docx")
        .with_status(200)
        .with_body("definitely not a zip archive")
        .create_async()
        .await;

    let reader = FileReader::new(reqwest::Client::new());
    let err = reader
        .read_file(&format!("{}/report.docx", server.url()), ".docx")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ExtractError");
}
