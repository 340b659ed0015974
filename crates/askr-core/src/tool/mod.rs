//! Tools the assistant can invoke before answering.

pub mod search;
