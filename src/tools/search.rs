//! Wikipedia search tool
//!
//! Retrieval goes through the [`SearchBackend`] trait; the default backend
//! queries the MediaWiki Action API in two steps: `list=search` for the best
//! matching titles, then `prop=extracts` for each title's plain-text intro.

use crate::tools::registry::{Tool, ToolContext};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Text returned when a query has no hits.
pub const NO_RESULT_TEXT: &str = "No good Wikipedia Search Result was found";

/// Opaque `query -> text` retrieval.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    /// Action API endpoint, e.g. `https://en.wikipedia.org/w/api.php`.
    pub base_url: String,
    /// Number of pages summarized per query.
    pub top_k: usize,
    /// Output is truncated to this many characters.
    pub max_chars: usize,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub timeout: Duration,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org/w/api.php".to_string(),
            top_k: 3,
            max_chars: 4000,
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(20),
        }
    }
}

/// MediaWiki Action API client.
pub struct WikipediaClient {
    http: reqwest::Client,
    config: WikipediaConfig,
}

impl WikipediaClient {
    pub fn new(config: WikipediaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("historical-court/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value> {
        let mut delay = self.config.retry_backoff;
        let mut attempt = 0;

        loop {
            let failure = match self
                .http
                .get(&self.config.base_url)
                .query(params)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<Value>()
                        .await
                        .map_err(|e| AppError::Tool(format!("Malformed Wikipedia response: {}", e)));
                }
                Ok(response) => {
                    let status = response.status();
                    let failure = AppError::Tool(format!(
                        "Wikipedia request failed with status {}",
                        status
                    ));
                    if status != StatusCode::TOO_MANY_REQUESTS && !status.is_server_error() {
                        return Err(failure);
                    }
                    failure
                }
                Err(e) => AppError::from(e),
            };

            if attempt >= self.config.max_retries {
                return Err(failure);
            }

            tracing::debug!(error = %failure, attempt, "Wikipedia unavailable, backing off");
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
            attempt += 1;
        }
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>> {
        let limit = self.config.top_k.to_string();
        let json = self
            .get_json(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("format", "json"),
            ])
            .await?;

        Ok(json["query"]["search"]
            .as_array()
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| hit["title"].as_str().map(String::from))
                    .take(self.config.top_k)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn extract(&self, title: &str) -> Result<Option<String>> {
        let json = self
            .get_json(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
            ])
            .await?;

        let extract = json["query"]["pages"].as_object().and_then(|pages| {
            pages
                .values()
                .find_map(|page| page["extract"].as_str())
                .map(|text| text.trim().to_string())
        });
        Ok(extract.filter(|text| !text.is_empty()))
    }
}

#[async_trait]
impl SearchBackend for WikipediaClient {
    async fn search(&self, query: &str) -> Result<String> {
        let titles = self.search_titles(query).await?;

        let mut summaries = Vec::new();
        for title in titles {
            if let Some(summary) = self.extract(&title).await? {
                summaries.push(format!("Page: {}\nSummary: {}", title, summary));
            }
        }

        if summaries.is_empty() {
            return Ok(NO_RESULT_TEXT.to_string());
        }

        Ok(truncate_chars(&summaries.join("\n\n"), self.config.max_chars))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// The `wikipedia` capability.
pub struct WikipediaTool {
    backend: Arc<dyn SearchBackend>,
}

impl WikipediaTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Look up a topic on Wikipedia and return summaries of the best matching pages"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Missing 'query' parameter".to_string()))?;

        tracing::info!(agent = ctx.agent(), query, "Searching Wikipedia");
        let text = self.backend.search(query).await?;

        Ok(json!({
            "status": "success",
            "query": query,
            "result": text
        }))
    }
}
