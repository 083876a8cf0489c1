use crate::history;
use crate::llm::{ChatMessage, Role, Usage};

/// Chronological message list whose first entry is always the instruction
/// message it was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system: ChatMessage) -> Self {
        Self {
            messages: vec![system],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn trim(&mut self, max_messages: usize) {
        if self.messages.len() > max_messages.max(1) {
            self.messages = history::trim(&self.messages, max_messages);
        }
    }

    /// Drop every turn, keeping the instruction message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    /// Messages shown to the user: everything except the instruction.
    pub fn visible(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub conversation: Conversation,
    /// Usage of the latest inference call, shown once and then dropped.
    pub last_usage: Option<Usage>,
}

impl ChatSession {
    pub fn new(system: ChatMessage) -> Self {
        Self {
            conversation: Conversation::new(system),
            last_usage: None,
        }
    }
}
