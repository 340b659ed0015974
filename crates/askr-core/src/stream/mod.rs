//! Streaming a chat turn to the client.
//!
//! - `data_stream`: wire frames, the bounded writer and the body stream
//! - `reasoning`: reasoning-span timing
//! - `orchestrator`: the per-turn task
//! - `finish`: related questions and persistence after the model finishes

pub mod data_stream;
pub mod finish;
pub mod orchestrator;
pub mod reasoning;
