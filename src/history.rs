use crate::llm::ChatMessage;

pub const DEFAULT_MAX_MESSAGES: usize = 10;

/// Bound `messages` to at most `max_messages` entries.
///
/// The first entry (the instruction message) is always kept, followed by the
/// newest `max_messages - 1` entries. Everything in between is dropped.
/// A bound of 0 is treated as 1.
pub fn trim(messages: &[ChatMessage], max_messages: usize) -> Vec<ChatMessage> {
    let max = max_messages.max(1);
    if messages.len() <= max {
        return messages.to_vec();
    }
    let tail = max - 1;
    let mut trimmed = Vec::with_capacity(max);
    trimmed.push(messages[0].clone());
    trimmed.extend_from_slice(&messages[messages.len() - tail..]);
    trimmed
}
