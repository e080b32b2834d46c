mod config;
mod messages;
mod metrics;
mod retry;
mod routes;

use anyhow::{Context, Result};
use books::GutenbergClient;
use extract::{CharacterAnalyzer, ChatClient, Pipeline};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::retry::RetryPolicy;
use crate::routes::{AppState, router};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    info!(?config, "Configuration loaded");

    if config.upstream.api_key.is_empty() {
        warn!("GROQ_API_KEY is not set; analysis requests will be rejected upstream");
    }

    let client = ChatClient::new(
        config.upstream.base_url.clone(),
        config.upstream.model.clone(),
        config.upstream.api_key.clone(),
    )
    .with_temperature(config.upstream.temperature)
    .with_timeout(Duration::from_secs(config.upstream.request_timeout_secs));

    let state = Arc::new(AppState {
        analyzer: CharacterAnalyzer::new(client, Pipeline::new(config.pipeline.clone())),
        books: GutenbergClient::new(config.books.base_url.clone(), config.books.max_content_chars),
        retry: RetryPolicy::new(
            config.retry.max_retries,
            config.retry.initial_backoff_ms,
            config.retry.max_backoff_ms,
        ),
        metrics: Metrics::new(),
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!(addr = %config.server.bind_addr, "Server listening");

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}
