//! Business logic and port definitions for askr.
//!
//! This crate defines the "ports" (repository, provider, search and auth
//! traits) that the infrastructure layer implements, and the chat flow built
//! on them. It depends only on `askr-types` -- never on `askr-infra` or any
//! database/IO crate.

pub mod agent;
pub mod auth;
pub mod chat;
pub mod llm;
pub mod stream;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;
