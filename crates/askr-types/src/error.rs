use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in askr-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the chat flow: retrieval, save actions and turn streaming.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat not found")]
    NotFound,

    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("turn cancelled")]
    Cancelled,
}

/// Errors from resolving a credential to a user.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("auth backend error: {0}")]
    Backend(String),
}

/// Errors from tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool '{0}' is not configured")]
    NotConfigured(String),

    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("tool request failed: {0}")]
    Request(String),

    #[error("tool response could not be parsed: {0}")]
    Deserialization(String),
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("missing environment variable {0}")]
    MissingEnv(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("failed to initialize provider '{name}': {message}")]
    ProviderInit { name: String, message: String },
}
