//! Infrastructure layer for askr.
//!
//! Implements the ports defined in `askr-core`: SQLite storage, API key
//! authentication, LLM providers (Anthropic, OpenAI-compatible), Tavily web
//! search, and the config.toml loader.

pub mod auth;
pub mod config;
pub mod llm;
pub mod search;
pub mod sqlite;
