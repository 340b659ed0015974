//! Web search backends.

pub mod tavily;

pub use tavily::TavilySearchProvider;
