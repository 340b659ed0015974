//! Related-question generation.

use askr_types::annotation::RelatedQuestions;
use askr_types::llm::{LlmError, Message};

use crate::agent::prompt::related_questions_prompt;
use crate::llm::registry::ResolvedModel;
use crate::llm::structured::generate_structured;

/// Number of follow-up questions kept.
const MAX_RELATED_QUESTIONS: usize = 3;

/// Generate follow-up questions for the conversation in `messages`.
#[tracing::instrument(
    name = "generate_related_questions",
    skip_all,
    fields(gen_ai.operation.name = "related_questions", gen_ai.request.model = %model.model_id())
)]
pub async fn generate_related_questions(
    model: &ResolvedModel,
    messages: Vec<Message>,
) -> Result<RelatedQuestions, LlmError> {
    let mut related: RelatedQuestions = generate_structured(
        &model.provider,
        model.model_id(),
        related_questions_prompt(),
        messages,
    )
    .await?;

    related.items.retain(|q| !q.query.trim().is_empty());
    related.items.truncate(MAX_RELATED_QUESTIONS);
    Ok(related)
}
