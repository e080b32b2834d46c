use anyhow::{Context, Result, bail};
use extract::{PipelineOptions, ValidationPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub retry: RetryConfig,
    pub pipeline: PipelineOptions,
    pub books: BooksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    #[serde(skip_serializing, default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksConfig {
    pub base_url: String,
    pub max_content_chars: usize,
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0:3000".to_string(),
            },
            upstream: UpstreamConfig {
                base_url: "https://api.groq.com/openai/v1".to_string(),
                model: "llama3-8b-8192".to_string(),
                temperature: 0.2,
                request_timeout_secs: 60,
                api_key: String::new(),
            },
            retry: RetryConfig {
                max_retries: 3,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
            pipeline: PipelineOptions::default(),
            books: BooksConfig {
                base_url: "https://www.gutenberg.org".to_string(),
                max_content_chars: 20_000,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each known variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.server.bind_addr = addr;
        }
        if let Some(key) = lookup("GROQ_API_KEY") {
            config.upstream.api_key = key;
        }
        if let Some(url) = lookup("GROQ_BASE_URL") {
            config.upstream.base_url = url;
        }
        if let Some(model) = lookup("GROQ_MODEL") {
            config.upstream.model = model;
        }
        if let Some(secs) = lookup("UPSTREAM_TIMEOUT_SECS") {
            config.upstream.request_timeout_secs = parse_var("UPSTREAM_TIMEOUT_SECS", &secs)?;
        }
        if let Some(retries) = lookup("MAX_RETRIES") {
            config.retry.max_retries = parse_var("MAX_RETRIES", &retries)?;
        }
        if let Some(url) = lookup("GUTENBERG_BASE_URL") {
            config.books.base_url = url;
        }
        if let Some(salvage) = lookup("SALVAGE_METADATA") {
            config.pipeline.salvage_metadata = parse_var("SALVAGE_METADATA", &salvage)?;
        }
        if let Some(range) = lookup("STRENGTH_RANGE") {
            config.pipeline.validation = ValidationPolicy {
                strength_range: Some(parse_range(&range)?),
            };
        }

        Ok(config)
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{name} has an invalid value: {value:?}"))
}

/// `"1-10"` → `(1, 10)`.
fn parse_range(value: &str) -> Result<(i64, i64)> {
    let Some((low, high)) = value.split_once('-') else {
        bail!("STRENGTH_RANGE must look like LOW-HIGH, got {value:?}");
    };
    let low: i64 = parse_var("STRENGTH_RANGE", low)?;
    let high: i64 = parse_var("STRENGTH_RANGE", high)?;
    if low > high {
        bail!("STRENGTH_RANGE lower bound exceeds upper bound");
    }
    Ok((low, high))
}
