//! Tavily search API client.
//!
//! `POST {base_url}/search` with a bearer API key. Images may come back as
//! plain URLs or as `{url, description}` objects; both are reduced to URLs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use askr_core::tool::search::{SearchProvider, SearchResultItem, SearchResults};
use askr_types::error::ToolError;

/// Default Tavily endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Minimum query length Tavily accepts; shorter queries are padded.
const MIN_QUERY_LEN: usize = 5;

pub struct TavilySearchProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: u32,
    search_depth: &'static str,
    include_images: bool,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    images: Vec<TavilyImage>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TavilyImage {
    Url(String),
    Described { url: String },
}

impl TavilyImage {
    fn into_url(self) -> String {
        match self {
            TavilyImage::Url(url) | TavilyImage::Described { url } => url,
        }
    }
}

impl TavilySearchProvider {
    pub fn new(api_key: SecretString, base_url: Option<&str>) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ToolError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

fn pad_query(query: &str) -> String {
    let len = query.chars().count();
    if len < MIN_QUERY_LEN {
        format!("{query}{}", " ".repeat(MIN_QUERY_LEN - len))
    } else {
        query.to_string()
    }
}

fn into_results(query: &str, response: TavilyResponse) -> SearchResults {
    SearchResults {
        query: query.to_string(),
        results: response
            .results
            .into_iter()
            .map(|r| SearchResultItem {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect(),
        images: response.images.into_iter().map(TavilyImage::into_url).collect(),
    }
}

impl SearchProvider for TavilySearchProvider {
    fn name(&self) -> &str {
        "tavily"
    }

    #[tracing::instrument(name = "tavily_search", skip(self))]
    async fn search(&self, query: &str, max_results: u32) -> Result<SearchResults, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("search query must not be empty".to_string()));
        }

        let padded = pad_query(query);
        let body = TavilyRequest {
            query: &padded,
            max_results,
            search_depth: "basic",
            include_images: true,
            include_answer: false,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::Request(format!("Tavily request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(ToolError::Request(format!(
                "Tavily API error ({}): {err_body}",
                status.as_u16()
            )));
        }

        let data: TavilyResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Deserialization(format!("Tavily response: {e}")))?;

        let results = into_results(query, data);
        tracing::debug!(results = results.results.len(), "search complete");
        Ok(results)
    }
}
