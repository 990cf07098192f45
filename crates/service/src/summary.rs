//! Reference summary lookup backed by the MediaWiki API.
//!
//! The best-matching page is found with a full-text search, then its intro is
//! fetched as plain text, limited to a few sentences.

use async_trait::async_trait;
use deckgen_core::{Config, Error, Result, Topic};
use serde::Deserialize;

/// Source of a short plain-text summary for a topic.
#[async_trait]
pub trait SummarySource: Send + Sync {
    /// Look up a summary. Failures are reported as [`Error::LookupFailed`].
    async fn summarize(&self, topic: &Topic) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

fn lookup_err(e: reqwest::Error) -> Error {
    Error::LookupFailed(e.to_string())
}

/// Wikipedia summaries via the MediaWiki action API.
#[derive(Debug, Clone)]
pub struct WikipediaSummary {
    client: reqwest::Client,
    api_url: String,
    sentences: u32,
}

impl WikipediaSummary {
    /// Create a lookup client against `api_url`.
    pub fn new(client: reqwest::Client, api_url: impl Into<String>, sentences: u32) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            sentences: sentences.max(1),
        }
    }

    /// Create a lookup client from configuration.
    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(client, config.wiki_url.clone(), config.summary_sentences)
    }

    /// Find the title of the page best matching `query`.
    async fn search_title(&self, query: &str) -> Result<String> {
        let response: SearchResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await
            .map_err(lookup_err)?
            .error_for_status()
            .map_err(lookup_err)?
            .json()
            .await
            .map_err(lookup_err)?;

        first_title(response)
            .ok_or_else(|| Error::LookupFailed(format!("no page matches '{}'", query)))
    }

    /// Fetch the plain-text intro of `title`.
    async fn intro_extract(&self, title: &str) -> Result<String> {
        let sentences = self.sentences.to_string();
        let response: ExtractResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exsentences", sentences.as_str()),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await
            .map_err(lookup_err)?
            .error_for_status()
            .map_err(lookup_err)?
            .json()
            .await
            .map_err(lookup_err)?;

        first_extract(response)
            .ok_or_else(|| Error::LookupFailed(format!("page '{}' has no summary", title)))
    }
}

#[async_trait]
impl SummarySource for WikipediaSummary {
    async fn summarize(&self, topic: &Topic) -> Result<String> {
        let title = self.search_title(topic.as_str()).await?;
        log::debug!("Topic '{}' resolved to page '{}'", topic, title);

        let summary = self.intro_extract(&title).await?;
        log::info!("Fetched {}-byte summary for '{}'", summary.len(), title);
        Ok(summary)
    }
}

fn first_title(response: SearchResponse) -> Option<String> {
    response
        .query?
        .search
        .into_iter()
        .map(|hit| hit.title)
        .find(|title| !title.trim().is_empty())
}

fn first_extract(response: ExtractResponse) -> Option<String> {
    response
        .query?
        .pages
        .into_iter()
        .filter(|page| !page.missing)
        .filter_map(|page| page.extract)
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    #[test]
    fn test_first_title() {
        let response: SearchResponse = serde_json::from_value(json!({
            "batchcomplete": true,
            "query": { "search": [ { "ns": 0, "title": "Photosynthesis", "pageid": 24544 } ] }
        }))
        .unwrap();
        assert_eq!(first_title(response), Some("Photosynthesis".to_string()));

        let empty: SearchResponse =
            serde_json::from_value(json!({ "query": { "search": [] } })).unwrap();
        assert_eq!(first_title(empty), None);
    }

    #[test]
    fn test_first_extract_skips_missing() {
        let response: ExtractResponse = serde_json::from_value(json!({
            "query": { "pages": [
                { "title": "Nope", "missing": true },
                { "title": "Photosynthesis", "extract": "  Photosynthesis is a process.  " }
            ] }
        }))
        .unwrap();
        assert_eq!(
            first_extract(response),
            Some("Photosynthesis is a process.".to_string())
        );

        let blank: ExtractResponse =
            serde_json::from_value(json!({ "query": { "pages": [ { "extract": "" } ] } })).unwrap();
        assert_eq!(first_extract(blank), None);
    }

    async fn fake_wiki(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        if params.get("list").map(String::as_str) == Some("search") {
            let hits = if params.get("srsearch").map(String::as_str) == Some("photosynthesis") {
                json!([{ "title": "Photosynthesis" }])
            } else {
                json!([])
            };
            return Json(json!({ "query": { "search": hits } }));
        }

        assert_eq!(params.get("titles").map(String::as_str), Some("Photosynthesis"));
        assert_eq!(params.get("exsentences").map(String::as_str), Some("2"));
        Json(json!({ "query": { "pages": [ {
            "title": "Photosynthesis",
            "extract": "Photosynthesis converts light. It happens in chloroplasts."
        } ] } }))
    }

    #[tokio::test]
    async fn test_summarize_against_fake_api() {
        let base = spawn_upstream(Router::new().route("/w/api.php", get(fake_wiki))).await;
        let source =
            WikipediaSummary::new(reqwest::Client::new(), format!("{}/w/api.php", base), 2);

        let topic = Topic::parse("photosynthesis").unwrap();
        let summary = source.summarize(&topic).await.unwrap();
        assert!(summary.starts_with("Photosynthesis converts light."));

        let unknown = Topic::parse("zzqx").unwrap();
        let err = source.summarize(&unknown).await.unwrap_err();
        assert!(matches!(err, Error::LookupFailed(_)));
    }

    #[tokio::test]
    async fn test_summarize_unreachable() {
        let source = WikipediaSummary::new(reqwest::Client::new(), "http://127.0.0.1:9/w/api.php", 5);
        let topic = Topic::parse("anything").unwrap();

        let err = source.summarize(&topic).await.unwrap_err();
        assert!(matches!(err, Error::LookupFailed(_)));
    }
}
