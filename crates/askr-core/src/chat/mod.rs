//! Chat persistence abstractions and save actions for askr.
//!
//! `ChatRepository` is implemented by the infrastructure layer;
//! `ChatService` holds the retrieval and save rules on top of it.

pub mod repository;
pub mod service;
