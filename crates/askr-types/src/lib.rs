//! Shared domain types for askr.
//!
//! This crate contains the core domain types used across askr: users, chats,
//! the message payload sum type, stream annotations, LLM request types,
//! configuration and the error types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, schemars.

pub mod annotation;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod user;
