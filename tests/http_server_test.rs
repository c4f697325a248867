//! End-to-end tests for the plugin HTTP router
//!
//! Each test binds the router to an ephemeral local port, points the GitHub and
//! Google clients at a `mockito` server and drives the endpoints with `reqwest`.

use std::net::SocketAddr;
use std::sync::Arc;

use mockito::{Matcher, Server, ServerGuard};
use plugin_apis::config::{AppConfig, GithubConfig, GoogleSearchConfig};
use plugin_apis::transport::{AppState, router};
use serde_json::{Value, json};

async fn spawn_app(upstream: &ServerGuard) -> SocketAddr {
    let config = AppConfig {
        github: GithubConfig {
            default_token: Some("default-token".to_string()),
            api_base: upstream.url(),
        },
        google_search: GoogleSearchConfig {
            api_key: Some("key".to_string()),
            search_engine_id: Some("engine".to_string()),
            http_proxy: None,
            endpoint: format!("{}/customsearch/v1", upstream.url()),
        },
        ..AppConfig::default()
    };
    let state = Arc::new(AppState::from_config(&config).expect("app state"));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

fn envelope(body: Value) -> Value {
    json!({
        "plugin_id": 1,
        "tool_id": "2",
        "user_id": 3,
        "secrets": {},
        "body": body
    })
}

async fn post(addr: SocketAddr, path: &str, payload: &Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/v1/{}", addr, path))
        .json(payload)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

async fn mock_tree(upstream: &mut ServerGuard) {
    upstream
        .mock("GET", "/repos/o/r")
        .with_status(200)
        .with_body(r#"{"default_branch": "main"}"#)
        .create_async()
        .await;
    upstream
        .mock("GET", "/repos/o/r/git/trees/main")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"tree": [
              {"path": "x", "type": "tree"},
              {"path": "x/b.txt", "type": "blob", "size": 3},
              {"path": "x/c", "type": "tree"}
            ]}"#,
        )
        .create_async()
        .await;
}

#[tokio::test]
async fn test_home_and_health() {
    let upstream = Server::new_async().await;
    let addr = spawn_app(&upstream).await;

    let home = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(home.text().await.unwrap(), "Aiagt plugin apis");

    let health: Value = reqwest::get(format!("http://{}/healthz", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_read_project_structure_recursive() {
    let mut upstream = Server::new_async().await;
    mock_tree(&mut upstream).await;
    let addr = spawn_app(&upstream).await;

    let (status, body) = post(
        addr,
        "github_reader/read_project_structure",
        &envelope(json!({"owner": "o", "repo": "r", "path": "/x/", "recursion": true})),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "code": 0,
            "msg": "success",
            "data": [
                {"path": "/x/b.txt", "type": "file", "size": 3, "children": null},
                {"path": "/x/c", "type": "dir", "size": null, "children": null}
            ]
        })
    );
}

#[tokio::test]
async fn test_read_project_structure_single_level_uses_request_token() {
    let mut upstream = Server::new_async().await;
    let mock = upstream
        .mock("GET", "/repos/o/r/contents/src")
        .match_header("authorization", "token request-token")
        .with_status(200)
        .with_body(r#"[{"name": "lib.rs", "type": "file", "size": 10}]"#)
        .create_async()
        .await;
    let addr = spawn_app(&upstream).await;

    let mut payload = envelope(json!({"owner": "o", "repo": "r", "path": "src/", "recursion": false}));
    payload["secrets"] = json!({"GITHUB_TOKEN": "request-token"});
    let (status, body) = post(addr, "github_reader/read_project_structure", &payload).await;

    mock.assert_async().await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["path"], "/src/lib.rs");
    assert_eq!(body["data"][0]["type"], "file");
}

#[tokio::test]
async fn test_read_files_content_echoes_requested_names() {
    let mut upstream = Server::new_async().await;
    upstream
        .mock("GET", "/repos/o/r/contents/a.txt")
        .with_status(200)
        .with_body("alpha")
        .create_async()
        .await;
    upstream
        .mock("GET", "/repos/o/r/contents/dir/b.txt")
        .with_status(200)
        .with_body("beta")
        .create_async()
        .await;
    let addr = spawn_app(&upstream).await;

    let (status, body) = post(
        addr,
        "github_reader/read_files_content",
        &envelope(json!({"owner": "o", "repo": "r", "files": ["/a.txt", "dir/b.txt"]})),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body["data"],
        json!([
            {"file": "/a.txt", "content": "alpha"},
            {"file": "dir/b.txt", "content": "beta"}
        ])
    );
}

#[tokio::test]
async fn test_read_files_content_upstream_failure() {
    let mut upstream = Server::new_async().await;
    upstream
        .mock("GET", "/repos/o/r/contents/missing.txt")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;
    let addr = spawn_app(&upstream).await;

    let (status, body) = post(
        addr,
        "github_reader/read_files_content",
        &envelope(json!({"owner": "o", "repo": "r", "files": ["missing.txt"]})),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["code"], 500);
    assert_eq!(body["data"], Value::Null);
    let msg = body["msg"].as_str().unwrap();
    assert!(
        msg.starts_with("server internal error: UpstreamError: "),
        "unexpected msg: {}",
        msg
    );
}

#[tokio::test]
async fn test_search_file() {
    let mut upstream = Server::new_async().await;
    mock_tree(&mut upstream).await;
    upstream
        .mock("GET", "/search/code")
        .match_query(Matcher::UrlEncoded("q".into(), "x repo:o/r in:file".into()))
        .with_status(200)
        .with_body(r#"{"items": [{"path": "x/b.txt"}]}"#)
        .create_async()
        .await;
    let addr = spawn_app(&upstream).await;

    let (status, body) = post(
        addr,
        "github_reader/search_file",
        &envelope(json!({"owner": "o", "repo": "r", "query": "/x/"})),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body["data"],
        json!([
            {"path": "/x", "type": "dir"},
            {"path": "/x/b.txt", "type": "file"},
            {"path": "/x/b.txt", "type": "file"},
            {"path": "/x/c", "type": "dir"}
        ])
    );
}

#[tokio::test]
async fn test_google_search_defaults() {
    let mut upstream = Server::new_async().await;
    upstream
        .mock("GET", "/customsearch/v1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "rust".into()),
            Matcher::UrlEncoded("start".into(), "1".into()),
            Matcher::UrlEncoded("num".into(), "3".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"items": [{"title": "Rust", "link": "https://rust-lang.org", "snippet": "A language"}]}"#)
        .create_async()
        .await;
    let addr = spawn_app(&upstream).await;

    let (status, body) = post(
        addr,
        "google_search/google_search",
        &envelope(json!({"query": "rust"})),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body["data"],
        json!({"items": [{"title": "Rust", "link": "https://rust-lang.org", "snippet": "A language"}]})
    );
}

#[tokio::test]
async fn test_read_link_text_and_file() {
    let mut upstream = Server::new_async().await;
    upstream
        .mock("GET", "/page")
        .with_status(200)
        .with_body("<h1>Title</h1><p>Body</p>")
        .create_async()
        .await;
    upstream
        .mock("GET", "/doc.txt")
        .with_status(200)
        .with_body("plain")
        .create_async()
        .await;
    let addr = spawn_app(&upstream).await;

    let (_, body) = post(
        addr,
        "google_search/read_link_text",
        &envelope(json!({"url": format!("{}/page", upstream.url())})),
    )
    .await;
    assert_eq!(body["data"], "TitleBody");

    let (_, body) = post(
        addr,
        "google_search/read_link_raw",
        &envelope(json!({"url": format!("{}/page", upstream.url())})),
    )
    .await;
    assert_eq!(body["data"], "<h1>Title</h1><p>Body</p>");

    let (_, body) = post(
        addr,
        "file_reader/read_file",
        &envelope(json!({"url": format!("{}/doc.txt", upstream.url()), "type": ".txt"})),
    )
    .await;
    assert_eq!(body["data"], "plain");
}

#[tokio::test]
async fn test_unsupported_file_type() {
    let upstream = Server::new_async().await;
    let addr = spawn_app(&upstream).await;

    let (status, body) = post(
        addr,
        "file_reader/read_file",
        &envelope(json!({"url": "http://127.0.0.1:9/a.pptx", "type": ".pptx"})),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(
        body["msg"],
        "server internal error: UnsupportedFileType: Unsupported file type: .pptx"
    );
}

#[tokio::test]
async fn test_bad_requests() {
    let upstream = Server::new_async().await;
    let addr = spawn_app(&upstream).await;

    let (status, body) = post(
        addr,
        "google_search/read_link_raw",
        &json!({"tool_id": 2, "user_id": 3, "body": {"url": "http://x"}}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(
        body,
        json!({"code": 400, "msg": "bad request: ValueError: missing plugin id", "data": null})
    );

    let (status, body) = post(
        addr,
        "github_reader/search_file",
        &envelope(json!({"owner": "o", "repo": "r"})),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["msg"].as_str().unwrap().starts_with("bad request: TypeError:"));

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/v1/google_search/read_link_raw", addr))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 400);
}
