use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing_subscriber::{self, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use plugin_apis::config::{AppConfig, GithubConfig, GoogleSearchConfig, HttpConfig, non_empty};
use plugin_apis::transport::HttpServerApp;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the plugin API HTTP server
    Http {
        /// Address to bind the HTTP server to
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        address: String,

        /// Enable debug logging
        #[arg(short, long)]
        debug: bool,

        /// Default GitHub API token, used when a request carries none
        #[arg(short = 't', long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        /// Proxy for GitHub, link and document requests
        #[arg(long, env = "HTTP_PROXY")]
        http_proxy: Option<String>,

        /// Google Programmable Search API key
        #[arg(long, env = "GOOGLE_SEARCH__GOOGLE_API_KEY", hide_env_values = true)]
        google_api_key: Option<String>,

        /// Google Programmable Search engine id (cx)
        #[arg(long, env = "GOOGLE_SEARCH__SEARCH_ENGINE_ID")]
        search_engine_id: Option<String>,

        /// Proxy for Google search requests
        #[arg(long, env = "GOOGLE_SEARCH__HTTP_PROXY")]
        google_http_proxy: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Http {
            address,
            debug,
            github_token,
            http_proxy,
            google_api_key,
            search_engine_id,
            google_http_proxy,
        } => {
            let config = AppConfig {
                bind_addr: address.parse::<SocketAddr>()?,
                debug,
                github: GithubConfig {
                    default_token: non_empty(github_token),
                    ..GithubConfig::default()
                },
                google_search: GoogleSearchConfig {
                    api_key: non_empty(google_api_key),
                    search_engine_id: non_empty(search_engine_id),
                    http_proxy: non_empty(google_http_proxy),
                    ..GoogleSearchConfig::default()
                },
                http: HttpConfig {
                    http_proxy: non_empty(http_proxy),
                },
            };
            run_http_server(config).await
        }
    }
}

async fn run_http_server(config: AppConfig) -> Result<()> {
    // Setup tracing
    let level = if config.debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{0},{1}={0}", level, env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false)) // Disable ANSI color codes
        .init();

    tracing::info!("Starting Plugin APIs on {}", config.bind_addr);

    if config.github.default_token.is_some() {
        tracing::info!("Using default GitHub token from command line or environment");
    }
    if let Some(proxy) = &config.http.http_proxy {
        tracing::info!("Using HTTP proxy {}", proxy);
    }
    if let Some(proxy) = &config.google_search.http_proxy {
        tracing::info!("Using Google search proxy {}", proxy);
    }

    let app = HttpServerApp::new(config);
    app.serve().await?;

    Ok(())
}
