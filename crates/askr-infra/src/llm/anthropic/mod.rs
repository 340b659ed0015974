//! Anthropic Claude LLM provider implementation.
//!
//! [`AnthropicProvider`] implements the
//! [`LlmProvider`](askr_core::llm::provider::LlmProvider) trait for the
//! Anthropic Messages API, including SSE streaming with extended thinking.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::AnthropicProvider;
