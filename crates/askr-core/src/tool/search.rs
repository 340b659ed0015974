//! Web search tool abstraction.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use askr_types::error::ToolError;

/// Name the search tool is exposed under in tool-call annotations.
pub const SEARCH_TOOL_NAME: &str = "search";

/// Results of a single web search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchResultItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl SearchResults {
    /// Empty result set for `query`.
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            images: Vec::new(),
        }
    }
}

/// Trait for web search backends.
///
/// Implementations live in askr-infra (e.g., `TavilySearchProvider`).
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> impl Future<Output = Result<SearchResults, ToolError>> + Send;
}

/// Object-safe version of [`SearchProvider`].
pub trait SearchProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn search_boxed<'a>(
        &'a self,
        query: &'a str,
        max_results: u32,
    ) -> Pin<Box<dyn Future<Output = Result<SearchResults, ToolError>> + Send + 'a>>;
}

impl<T: SearchProvider> SearchProviderDyn for T {
    fn name(&self) -> &str {
        SearchProvider::name(self)
    }

    fn search_boxed<'a>(
        &'a self,
        query: &'a str,
        max_results: u32,
    ) -> Pin<Box<dyn Future<Output = Result<SearchResults, ToolError>> + Send + 'a>> {
        Box::pin(self.search(query, max_results))
    }
}

/// Type-erased search backend.
pub struct BoxSearchProvider {
    inner: Box<dyn SearchProviderDyn>,
}

impl BoxSearchProvider {
    pub fn new<T: SearchProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn search(&self, query: &str, max_results: u32) -> Result<SearchResults, ToolError> {
        self.inner.search_boxed(query, max_results).await
    }
}
