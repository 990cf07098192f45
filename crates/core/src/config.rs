//! Runtime configuration.
//!
//! Built once at startup and handed to the pipeline and server.

use crate::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default OpenAI-compatible chat completions endpoint.
pub const DEFAULT_LLM_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";

/// Default MediaWiki API endpoint.
pub const DEFAULT_WIKI_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Default number of summary sentences requested.
pub const DEFAULT_SUMMARY_SENTENCES: u32 = 5;

/// Configuration for the deck generator.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the LLM endpoint. Requests fail without it.
    pub api_key: Option<String>,

    /// Model identifier sent to the LLM endpoint.
    pub model: String,

    /// Chat completions URL.
    pub llm_url: String,

    /// Value of the `HTTP-Referer` header sent to the LLM endpoint.
    pub referer: String,

    /// MediaWiki API URL used for summaries.
    pub wiki_url: String,

    /// Number of sentences requested from the summary lookup.
    pub summary_sentences: u32,

    /// Directory generated decks are written to and served from.
    pub output_dir: PathBuf,

    /// Address the HTTP server binds to.
    pub bind: SocketAddr,

    /// Optional timeout applied to outbound HTTP calls.
    pub http_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            llm_url: DEFAULT_LLM_URL.to_string(),
            referer: "http://localhost:5000".to_string(),
            wiki_url: DEFAULT_WIKI_URL.to_string(),
            summary_sentences: DEFAULT_SUMMARY_SENTENCES,
            output_dir: PathBuf::from("static/ppt"),
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            http_timeout: None,
        }
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using a custom variable lookup.
    ///
    /// Unset or blank variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        config.api_key = get("OPENROUTER_API_KEY");
        if let Some(model) = get("DECKGEN_MODEL") {
            config.model = model;
        }
        if let Some(url) = get("DECKGEN_LLM_URL") {
            config.llm_url = url;
        }
        if let Some(referer) = get("DECKGEN_REFERER") {
            config.referer = referer;
        }
        if let Some(url) = get("DECKGEN_WIKI_URL") {
            config.wiki_url = url;
        }
        if let Some(sentences) = get("DECKGEN_SUMMARY_SENTENCES") {
            config.summary_sentences = sentences.parse().map_err(|_| {
                Error::ConfigError(format!(
                    "DECKGEN_SUMMARY_SENTENCES must be a positive integer, got '{}'",
                    sentences
                ))
            })?;
        }
        if let Some(dir) = get("DECKGEN_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(bind) = get("DECKGEN_BIND") {
            config.bind = bind.parse().map_err(|_| {
                Error::ConfigError(format!("DECKGEN_BIND is not a socket address: '{}'", bind))
            })?;
        }
        if let Some(secs) = get("DECKGEN_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::ConfigError(format!(
                    "DECKGEN_HTTP_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    secs
                ))
            })?;
            config.http_timeout = Some(Duration::from_secs(secs));
        }

        if config.summary_sentences == 0 {
            return Err(Error::ConfigError(
                "DECKGEN_SUMMARY_SENTENCES must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Whether an LLM API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
