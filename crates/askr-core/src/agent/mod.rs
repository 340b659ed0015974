//! Model-driven helpers around a chat turn.
//!
//! - `prompt`: system prompts for the answer and auxiliary calls
//! - `title`: chat title generation on first save
//! - `related`: follow-up question generation
//! - `tool_call`: the search step run before answering in search mode

pub mod prompt;
pub mod related;
pub mod title;
pub mod tool_call;
