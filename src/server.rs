use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::commands::chat;
use crate::render::{self, PageView, STYLE};
use crate::session::models::Conversation;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "topic_chat_session";

#[derive(Deserialize)]
struct ChatForm {
    #[serde(default)]
    message: String,
}

/// Build the [`axum::Router`] serving the chat page and its two actions.
///
/// - `GET /` renders the page for the caller's session.
/// - `POST /chat` submits one message, then redirects to `/`.
/// - `POST /reset` discards the conversation, then redirects to `/`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(submit))
        .route("/reset", post(reset))
        .route("/style.css", get(style))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `bind` and serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "serving chat page");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received shutdown signal");
        })
        .await?;
    Ok(())
}

async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, fresh) = resolve_session(&headers);
    // Visitors that never submit anything leave no trace in the store.
    let rendered = match state.sessions.get(&session_id) {
        Some(handle) => {
            let mut session = handle.lock().await;
            let usage = session.last_usage.take();
            render::render_page(&PageView::new(
                &state.settings.policy,
                &session.conversation,
                usage,
            ))
        }
        None => {
            let empty = Conversation::new(state.sessions.system_message().clone());
            render::render_page(&PageView::new(&state.settings.policy, &empty, None))
        }
    };
    let response = match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
        }
    };
    with_cookie(response, &session_id, fresh)
}

async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Response {
    let (session_id, fresh) = resolve_session(&headers);
    let outcome = chat::submit(&state, &session_id, &form.message).await;
    tracing::debug!(session = %session_id, ?outcome, "handled submission");
    with_cookie(Redirect::to("/").into_response(), &session_id, fresh)
}

async fn reset(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, fresh) = resolve_session(&headers);
    chat::reset(&state, &session_id).await;
    with_cookie(Redirect::to("/").into_response(), &session_id, fresh)
}

async fn style() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/css; charset=utf-8")], STYLE)
}

async fn health() -> &'static str {
    "ok"
}

/// Session id from the request cookie, or a new one. The flag is true when
/// the id was just minted and must be sent back.
fn resolve_session(headers: &HeaderMap) -> (String, bool) {
    match session_cookie(headers) {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

fn with_cookie(mut response: Response, session_id: &str, fresh: bool) -> Response {
    if !fresh {
        return response;
    }
    let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "invalid session cookie"),
    }
    response
}
