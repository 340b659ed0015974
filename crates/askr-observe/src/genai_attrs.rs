//! OpenTelemetry GenAI Semantic Convention attribute names.
//!
//! Usable with `Span::record` on spans that declared the field. Spans built
//! with `info_span!`/`#[instrument]` spell the same names literally.

/// The name of the operation being performed (e.g., "chat").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "anthropic").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

/// The model ID requested.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The maximum number of output tokens requested.
pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reason for the response (e.g., "stop", "length").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Operation name values ---

/// Streamed chat answer.
pub const OP_CHAT: &str = "chat";

/// Search tool step before answering.
pub const OP_EXECUTE_TOOL: &str = "execute_tool";

/// Chat title generation on first save.
pub const OP_GENERATE_TITLE: &str = "generate_title";

/// Follow-up question generation.
pub const OP_RELATED_QUESTIONS: &str = "related_questions";
