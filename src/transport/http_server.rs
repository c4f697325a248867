//! Plugin API HTTP server
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/v1/github_reader/read_project_structure` | Directory listing or full tree |
//! | `POST` | `/api/v1/github_reader/read_files_content` | Raw contents of several files |
//! | `POST` | `/api/v1/github_reader/search_file` | Name and code search |
//! | `POST` | `/api/v1/google_search/google_search` | Web search |
//! | `POST` | `/api/v1/google_search/read_link_raw` | Fetch a page as-is |
//! | `POST` | `/api/v1/google_search/read_link_text` | Fetch a page as plain text |
//! | `POST` | `/api/v1/file_reader/read_file` | Download a document and extract its text |
//! | `GET`  | `/` | Banner |
//! | `GET`  | `/healthz` | Health check |
//!
//! Every `POST` endpoint takes a [`PluginRequest`] envelope and answers with a
//! [`PluginResponse`] envelope.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::envelope::{ApiError, PluginRequest, PluginResponse};
use super::params::{
    FileContent, GoogleSearchParams, ReadFileParams, ReadFilesContentParams, ReadLinkParams,
    ReadProjectStructureParams, SearchFileParams,
};
use crate::config::AppConfig;
use crate::github::{FileNode, GithubClient, GithubReader, SearchHit};
use crate::services::{FileReader, GoogleSearchClient, GoogleSearchResults, LinkReader};

/// Secret carrying a per-request GitHub token
pub const GITHUB_TOKEN_SECRET: &str = "GITHUB_TOKEN";

/// Banner served at `/`
pub const BANNER: &str = "Aiagt plugin apis";

/// Clients shared by all handlers
pub struct AppState {
    pub github: GithubReader<GithubClient>,
    pub google: GoogleSearchClient,
    pub links: LinkReader,
    pub files: FileReader,
}

impl AppState {
    /// Builds every client from `config`.
    ///
    /// The GitHub, link and document clients share the general proxy; the
    /// search client uses its own.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = config.http.build_client()?;
        let google_http = config.google_search.build_client()?;

        let github = GithubClient::new(http.clone(), &config.github);
        if !github.credentials().has_default() {
            tracing::info!("No default GitHub token configured; requests without one are anonymous");
        }

        Ok(Self {
            github: GithubReader::new(github),
            google: GoogleSearchClient::new(google_http, &config.google_search),
            links: LinkReader::new(http.clone()),
            files: FileReader::new(http),
        })
    }
}

type AppResult<T> = std::result::Result<PluginResponse<T>, ApiError>;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let github_reader = Router::new()
        .route("/read_project_structure", post(read_project_structure))
        .route("/read_files_content", post(read_files_content))
        .route("/search_file", post(search_file));

    let google_search = Router::new()
        .route("/google_search", post(google_search))
        .route("/read_link_raw", post(read_link_raw))
        .route("/read_link_text", post(read_link_text));

    let file_reader = Router::new().route("/read_file", post(read_file));

    let api = Router::new()
        .nest("/github_reader", github_reader)
        .nest("/google_search", google_search)
        .nest("/file_reader", file_reader);

    Router::new()
        .route("/", get(home))
        .route("/healthz", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn home() -> &'static str {
    BANNER
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ github_reader ============

async fn read_project_structure(
    State(state): State<Arc<AppState>>,
    req: PluginRequest<ReadProjectStructureParams>,
) -> AppResult<Vec<FileNode>> {
    let ReadProjectStructureParams {
        owner,
        repo,
        path,
        recursion,
    } = &req.body;
    let path = path.trim_matches('/');
    let token = req.secret(GITHUB_TOKEN_SECRET);
    tracing::info!(
        "read_project_structure {}/{} path='{}' recursion={}",
        owner,
        repo,
        path,
        recursion
    );

    let nodes = if *recursion {
        state.github.get_tree(owner, repo, path, token).await?
    } else {
        state.github.get_files(owner, repo, path, token).await?
    };
    Ok(PluginResponse::success(nodes))
}

async fn read_files_content(
    State(state): State<Arc<AppState>>,
    req: PluginRequest<ReadFilesContentParams>,
) -> AppResult<Vec<FileContent>> {
    let ReadFilesContentParams { owner, repo, files } = &req.body;
    let token = req.secret(GITHUB_TOKEN_SECRET);
    tracing::info!("read_files_content {}/{}: {} files", owner, repo, files.len());

    let mut contents = Vec::with_capacity(files.len());
    for file in files {
        let content = state
            .github
            .get_file_content(owner, repo, file.trim_matches('/'), token)
            .await?;
        contents.push(FileContent {
            file: file.clone(),
            content,
        });
    }
    Ok(PluginResponse::success(contents))
}

async fn search_file(
    State(state): State<Arc<AppState>>,
    req: PluginRequest<SearchFileParams>,
) -> AppResult<Vec<SearchHit>> {
    let SearchFileParams { owner, repo, query } = &req.body;
    let query = query.trim_matches('/');
    tracing::info!("search_file {}/{} query='{}'", owner, repo, query);

    let hits = state
        .github
        .search_file(owner, repo, query, req.secret(GITHUB_TOKEN_SECRET))
        .await?;
    Ok(PluginResponse::success(hits))
}

// ============ google_search ============

async fn google_search(
    State(state): State<Arc<AppState>>,
    req: PluginRequest<GoogleSearchParams>,
) -> AppResult<GoogleSearchResults> {
    let GoogleSearchParams { query, num, start } = &req.body;
    tracing::info!("google_search '{}' num={} start={}", query, num, start);

    let results = state.google.search(query, *num, *start).await?;
    Ok(PluginResponse::success(results))
}

async fn read_link_raw(
    State(state): State<Arc<AppState>>,
    req: PluginRequest<ReadLinkParams>,
) -> AppResult<String> {
    tracing::info!("read_link_raw {}", req.body.url);
    let raw = state.links.read_link_raw(&req.body.url).await?;
    Ok(PluginResponse::success(raw))
}

async fn read_link_text(
    State(state): State<Arc<AppState>>,
    req: PluginRequest<ReadLinkParams>,
) -> AppResult<String> {
    tracing::info!("read_link_text {}", req.body.url);
    let text = state.links.read_link_text(&req.body.url).await?;
    Ok(PluginResponse::success(text))
}

// ============ file_reader ============

async fn read_file(
    State(state): State<Arc<AppState>>,
    req: PluginRequest<ReadFileParams>,
) -> AppResult<String> {
    let ReadFileParams { url, file_type } = &req.body;
    tracing::info!("read_file {} ({})", url, file_type);

    let text = state.files.read_file(url, file_type).await?;
    Ok(PluginResponse::success(text))
}

/// HTTP server bound to the configured address
pub struct HttpServerApp {
    config: AppConfig,
}

impl HttpServerApp {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Serves until Ctrl+C.
    pub async fn serve(self) -> Result<()> {
        let state = Arc::new(AppState::from_config(&self.config)?);
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!("Plugin APIs listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C signal to gracefully shutdown
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
