//! LLM provider abstractions for askr.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `ProviderRegistry`: providers by name, model resolution
//! - `context_window`: token estimation and history truncation
//! - `structured`: JSON-schema constrained generation

pub mod box_provider;
pub mod context_window;
pub mod convert;
pub mod provider;
pub mod registry;
pub mod structured;
