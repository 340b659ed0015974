//! Context window truncation.
//!
//! Token counts are estimated (about 4 characters per token plus a fixed
//! per-message overhead); no tokenizer is involved.

use askr_types::llm::{Message, MessageRole};

/// Estimated framing overhead per message, in tokens.
const MESSAGE_OVERHEAD_TOKENS: u32 = 10;

/// Rough token estimate for a single message.
pub fn estimate_message_tokens(message: &Message) -> u32 {
    let chars = message.content.chars().count() as u32;
    chars.div_ceil(4) + MESSAGE_OVERHEAD_TOKENS
}

/// Rough token estimate for a list of messages.
pub fn estimate_tokens(messages: &[Message]) -> u32 {
    messages.iter().map(estimate_message_tokens).sum()
}

/// Trim `messages` to fit within `max_tokens`.
///
/// Drops the oldest messages first. The newest message is always kept,
/// even if it alone exceeds the budget. After trimming, leading non-user
/// messages are dropped so the history starts with a user turn (unless
/// that would leave nothing but the newest message).
pub fn truncate_messages(messages: Vec<Message>, max_tokens: u32) -> Vec<Message> {
    let Some(newest) = messages.last() else {
        return messages;
    };

    let mut used = estimate_message_tokens(newest);
    let mut keep_from = messages.len() - 1;
    for (idx, message) in messages.iter().enumerate().rev().skip(1) {
        let cost = estimate_message_tokens(message);
        if used + cost > max_tokens {
            break;
        }
        used += cost;
        keep_from = idx;
    }

    let last = messages.len() - 1;
    while keep_from < last && messages[keep_from].role != MessageRole::User {
        keep_from += 1;
    }

    let dropped = keep_from;
    if dropped > 0 {
        tracing::debug!(dropped, kept = messages.len() - dropped, max_tokens, "truncated chat history");
    }

    messages.into_iter().skip(keep_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: MessageRole, chars: usize) -> Message {
        Message {
            role,
            content: "x".repeat(chars),
        }
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_message_tokens(&msg(MessageRole::User, 0)), 10);
        assert_eq!(estimate_message_tokens(&msg(MessageRole::User, 40)), 20);
        assert_eq!(estimate_message_tokens(&msg(MessageRole::User, 41)), 21);
        assert_eq!(
            estimate_tokens(&[msg(MessageRole::User, 40), msg(MessageRole::Assistant, 40)]),
            40
        );
    }

    #[test]
    fn test_fits_unchanged() {
        let messages = vec![
            msg(MessageRole::User, 40),
            msg(MessageRole::Assistant, 40),
            msg(MessageRole::User, 40),
        ];
        let out = truncate_messages(messages.clone(), 1_000);
        assert_eq!(out, messages);
    }

    #[test]
    fn test_drops_oldest_first() {
        // Each message costs 20 tokens; budget fits three.
        let messages: Vec<Message> = (0..6)
            .map(|i| {
                let role = if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant };
                Message {
                    role,
                    content: format!("{i}").repeat(40),
                }
            })
            .collect();
        let out = truncate_messages(messages, 60);
        // Kept indices 3,4,5 then the leading assistant (3) is dropped.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].role, MessageRole::User);
        assert!(out[0].content.starts_with('4'));
        assert!(out[1].content.starts_with('5'));
    }

    #[test]
    fn test_always_keeps_newest() {
        let messages = vec![msg(MessageRole::User, 40), msg(MessageRole::User, 100_000)];
        let out = truncate_messages(messages, 100);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content.len(), 100_000);
    }

    #[test]
    fn test_empty_history() {
        assert!(truncate_messages(Vec::new(), 100).is_empty());
    }
}
