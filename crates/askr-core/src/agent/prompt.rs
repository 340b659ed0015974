//! System prompts for the research assistant.

use chrono::{DateTime, Utc};

const RESEARCHER_PROMPT: &str = "You are a helpful research assistant. Answer the user's question \
accurately and concisely, using Markdown for structure where it helps. If you are unsure, \
say so instead of guessing.";

const SEARCH_RESULTS_PROMPT: &str = "Web search results for the user's question are included \
in the conversation. Base your answer on them, cite sources inline as Markdown links \
using their URLs, and say so if the results do not answer the question.";

const RELATED_QUESTIONS_PROMPT: &str = "As a professional web researcher, generate three \
follow-up queries that explore the subject of the conversation more deeply. Each query \
must be self-contained and understandable without the conversation. Write the queries in \
the same language as the user.";

const SEARCH_PLANNER_PROMPT: &str = "You decide what to search the web for to answer the \
user's latest message. Produce one concise search query that would find the information \
needed. Include names, dates and places from the conversation so the query stands on its own.";

/// System prompt for the answer model.
pub fn researcher_prompt(now: DateTime<Utc>, with_search_results: bool) -> String {
    let mut prompt = format!(
        "{RESEARCHER_PROMPT}\n\nCurrent date and time: {}",
        now.format("%Y-%m-%d %H:%M UTC")
    );
    if with_search_results {
        prompt.push_str("\n\n");
        prompt.push_str(SEARCH_RESULTS_PROMPT);
    }
    prompt
}

/// Instructions for related-question generation.
pub fn related_questions_prompt() -> &'static str {
    RELATED_QUESTIONS_PROMPT
}

/// Instructions for choosing a search query.
pub fn search_planner_prompt(now: DateTime<Utc>) -> String {
    format!(
        "{SEARCH_PLANNER_PROMPT}\n\nCurrent date: {}",
        now.format("%Y-%m-%d")
    )
}
