use crate::llm::{ChatMessage, ChatRequest, LlmError};
use crate::state::AppState;

/// Prefix of the assistant reply written when the model call fails.
pub const ERROR_REPLY_PREFIX: &str = "Prišlo je do napake pri povezavi z modelom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing was recorded.
    Ignored,
    Answered,
    /// The call failed and the error text was recorded as the reply.
    Failed,
}

pub fn error_reply(err: &LlmError) -> String {
    format!("{ERROR_REPLY_PREFIX}: `{err}`")
}

/// Handle one user turn for `session_id`.
///
/// The session stays locked for the whole call, so a second submission from
/// the same session waits for this one. Inference errors never escape: they
/// become the assistant's reply and the user's message is kept.
pub async fn submit(state: &AppState, session_id: &str, text: &str) -> SubmitOutcome {
    if text.trim().is_empty() {
        return SubmitOutcome::Ignored;
    }

    let handle = state.sessions.get_or_create(session_id);
    let mut session = handle.lock().await;
    session.last_usage = None;

    // 1. Record the user turn and bound the history
    session.conversation.push(ChatMessage::user(text));
    session.conversation.trim(state.settings.max_messages);

    // 2. Ask the model with everything that is left
    let request = ChatRequest {
        messages: session.conversation.messages().to_vec(),
        model: state.settings.model.clone(),
        temperature: state.settings.temperature,
    };

    // 3. Record the reply, or the error in its place
    match state.provider.chat(&request).await {
        Ok(response) => {
            tracing::debug!(session = session_id, usage = ?response.usage, "model replied");
            session.conversation.push(ChatMessage::assistant(response.content));
            session.last_usage = response.usage;
            SubmitOutcome::Answered
        }
        Err(e) => {
            tracing::warn!(session = session_id, error = %e, "model call failed");
            session.conversation.push(ChatMessage::assistant(error_reply(&e)));
            SubmitOutcome::Failed
        }
    }
}

/// Discard every turn of `session_id`. No confirmation.
pub async fn reset(state: &AppState, session_id: &str) {
    tracing::debug!(session = session_id, "resetting conversation");
    state.sessions.reset(session_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::llm::openai::OpenAiConfig;
    use crate::llm::{Role, Usage};
    use crate::prompt::PromptPolicy;
    use httpmock::prelude::*;
    use serde_json::json;

    fn state(base_url: String, max_messages: usize) -> AppState {
        AppState::new(Settings {
            llm: OpenAiConfig {
                api_key: "secret".into(),
                base_url,
            },
            model: "llama-3.3-70b-versatile".into(),
            temperature: 0.4,
            max_messages,
            policy: PromptPolicy::default(),
            bind: "127.0.0.1:0".into(),
        })
    }

    fn mock_reply(server: &MockServer, content: &str) {
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": content}}],
                "usage": {"prompt_tokens": 30, "completion_tokens": 5, "total_tokens": 35}
            }));
        });
    }

    #[tokio::test]
    async fn test_submit_appends_user_and_reply() {
        let server = MockServer::start();
        mock_reply(&server, "Ljubljana je prestolnica.");
        let state = state(server.base_url(), 10);

        let outcome = submit(&state, "s", "Hello").await;

        assert_eq!(outcome, SubmitOutcome::Answered);
        let messages = state.sessions.snapshot("s").await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1], ChatMessage::user("Hello"));
        assert_eq!(
            messages[2],
            ChatMessage::assistant("Ljubljana je prestolnica.")
        );
        let usage = state.sessions.get_or_create("s").lock().await.last_usage;
        assert_eq!(
            usage,
            Some(Usage {
                prompt_tokens: 30,
                completion_tokens: 5,
                total_tokens: 35
            })
        );
    }

    #[tokio::test]
    async fn test_submit_failure_records_error_and_keeps_user_turn() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401).body("invalid api key");
        });
        let state = state(server.base_url(), 10);

        let outcome = submit(&state, "s", "Hello").await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        let messages = state.sessions.snapshot("s").await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], ChatMessage::user("Hello"));
        assert_eq!(messages[2].role, Role::Assistant);
        assert!(messages[2].content.starts_with(ERROR_REPLY_PREFIX));
        assert!(messages[2].content.contains("API error: 401 - invalid api key"));
        assert!(state
            .sessions
            .get_or_create("s")
            .lock()
            .await
            .last_usage
            .is_none());
    }

    #[tokio::test]
    async fn test_submit_failure_grows_conversation_by_one_after_user_turn() {
        // Nothing listens on this port, so the transport itself fails.
        let state = state("http://127.0.0.1:9".into(), 10);
        submit(&state, "s", "first").await;
        let before = state.sessions.snapshot("s").await.len();

        submit(&state, "s", "second").await;

        let messages = state.sessions.snapshot("s").await;
        assert_eq!(messages.len(), before + 2);
        assert_eq!(messages[messages.len() - 2], ChatMessage::user("second"));
        assert!(messages
            .last()
            .unwrap()
            .content
            .starts_with(ERROR_REPLY_PREFIX));
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        let state = state("http://127.0.0.1:9".into(), 10);
        assert_eq!(submit(&state, "s", "   ").await, SubmitOutcome::Ignored);
        assert_eq!(state.sessions.snapshot("s").await.len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_trimmed_before_the_call() {
        let server = MockServer::start();
        mock_reply(&server, "ok");
        let state = state(server.base_url(), 4);

        for i in 0..5 {
            submit(&state, "s", &format!("q{i}")).await;
        }

        let messages = state.sessions.snapshot("s").await;
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        // trim runs after the user turn, then the reply is appended
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(&contents[1..], &["q3", "ok", "q4", "ok"]);
    }

    #[tokio::test]
    async fn test_max_messages_one_keeps_only_the_instruction() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .json_body(json!({"choices": [{"message": {"content": "ok"}}]}));
        });
        let state = state(server.base_url(), 1);

        assert_eq!(submit(&state, "s", "Hello").await, SubmitOutcome::Answered);

        mock.assert();
        let messages = state.sessions.snapshot("s").await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1], ChatMessage::assistant("ok"));
    }

    #[tokio::test]
    async fn test_reset_discards_turns() {
        let server = MockServer::start();
        mock_reply(&server, "ok");
        let state = state(server.base_url(), 10);
        submit(&state, "s", "Hello").await;

        reset(&state, "s").await;

        let messages = state.sessions.snapshot("s").await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
    }
}
