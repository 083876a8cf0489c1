//! Instruction text that pins the model to one topic and one language.
//!
//! The restriction is advisory: nothing downstream inspects the model's
//! answers, so the wording here is the only scope enforcement there is.

use crate::llm::ChatMessage;

pub const DEFAULT_TOPIC: &str = "Ljubljana";

/// Language every answer must be written in.
pub const OUTPUT_LANGUAGE: &str = "Slovenian";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPolicy {
    topic: String,
}

impl PromptPolicy {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn system_prompt(&self) -> String {
        let topic = &self.topic;
        format!(
            "You are a friendly assistant and an expert in the field of: {topic}. \
             Answer only questions that are directly related to '{topic}'. \
             If the user asks about anything outside this field, politely say that you \
             have no information about it and steer the conversation back to '{topic}'. \
             Do not guess and do not answer general questions. \
             Communicate exclusively in {OUTPUT_LANGUAGE}. \
             Answers must be clear, grammatically correct and well structured."
        )
    }

    pub fn system_message(&self) -> ChatMessage {
        ChatMessage::system(self.system_prompt())
    }
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC)
    }
}
