//! HTML for the chat page.
//!
//! Rendering is a pure function of a [`PageView`]; handlers build the view
//! from session state and never mutate anything while rendering. Plain values
//! go through TinyTemplate's default formatter, which HTML-escapes them.
//! Message bodies are Markdown, converted to HTML and sanitized before they
//! reach the template, where they are written unescaped.

use crate::llm::{Role, Usage};
use crate::prompt::PromptPolicy;
use crate::session::models::Conversation;
use pulldown_cmark::{html, Options, Parser};
use serde::Serialize;
use tinytemplate::TinyTemplate;

pub const PAGE_TITLE: &str = "Pametni klepetalnik";

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="sl">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/style.css">
</head>
<body>
<main>
<h1>💬 {title}</h1>
<div class="toolbar">
<form method="post" action="/reset"><button type="submit">🔄 Reset</button></form>
<span class="caption">Specializacija: <strong>{topic}</strong></span>
</div>
<section class="history">
{{ for message in messages }}<div class="msg msg-{message.role}"><span class="who">{message.label}</span><div class="body">{message.html | unescaped}</div></div>
{{ endfor }}</section>
{{ if usage }}<details class="usage"><summary>📊 Poraba žetonov</summary>
<ul>
<li>Vprašanje (prompt): {usage.prompt_tokens}</li>
<li>Odgovor (completion): {usage.completion_tokens}</li>
<li>Skupaj: {usage.total_tokens}</li>
</ul>
</details>
{{ endif }}<form class="chat-input" method="post" action="/chat">
<input type="text" name="message" placeholder="Vpiši vprašanje ..." autocomplete="off" autofocus required>
<button type="submit">Pošlji</button>
</form>
</main>
</body>
</html>
"#;

/// Dark theme for the page, served from `/style.css`.
pub const STYLE: &str = r#"body {
  margin: 0;
  background-color: #0f172a;
  color: #e2e8f0;
  font-family: system-ui, sans-serif;
}
main {
  max-width: 46rem;
  margin: 0 auto;
  padding: 1.5rem 1rem 6rem;
}
.toolbar {
  display: flex;
  align-items: center;
  gap: 1rem;
  margin-bottom: 1rem;
}
.caption {
  color: #94a3b8;
}
.msg {
  display: flex;
  gap: 0.75rem;
  padding: 0.75rem 0;
  border-bottom: 1px solid #1e293b;
}
.who {
  min-width: 5rem;
  font-weight: 600;
}
.msg-user .who {
  color: #f97316;
}
.msg-assistant .who {
  color: #facc15;
}
.body {
  line-height: 1.5;
  overflow-wrap: anywhere;
}
.body p:first-child {
  margin-top: 0;
}
.body p:last-child {
  margin-bottom: 0;
}
.body code {
  background-color: #1e293b;
  padding: 0 0.2rem;
  border-radius: 0.2rem;
}
.usage {
  margin: 1rem 0;
  color: #94a3b8;
}
.chat-input {
  position: fixed;
  bottom: 0;
  left: 0;
  right: 0;
  display: flex;
  gap: 0.5rem;
  padding: 1rem;
  background-color: #0f172a;
  justify-content: center;
}
.chat-input input {
  width: min(40rem, 80vw);
  padding: 0.6rem;
  background-color: #111827;
  color: #e2e8f0;
  border: 1px solid #334155;
  border-radius: 0.4rem;
}
button {
  background-color: #1e293b;
  color: #e2e8f0;
  border: 1px solid #334155;
  border-radius: 0.4rem;
  padding: 0.5rem 0.9rem;
  cursor: pointer;
}
"#;

#[derive(Serialize)]
pub struct MessageView {
    pub role: Role,
    pub label: &'static str,
    /// Sanitized HTML of the message's Markdown.
    pub html: String,
}

#[derive(Serialize)]
pub struct PageView<'a> {
    pub title: &'static str,
    pub topic: &'a str,
    pub messages: Vec<MessageView>,
    pub usage: Option<Usage>,
}

impl<'a> PageView<'a> {
    /// View of `conversation` without its instruction message.
    pub fn new(
        policy: &'a PromptPolicy,
        conversation: &'a Conversation,
        usage: Option<Usage>,
    ) -> Self {
        let messages = conversation
            .visible()
            .map(|m| MessageView {
                role: m.role,
                label: role_label(m.role),
                html: markdown_to_html(&m.content),
            })
            .collect();
        Self {
            title: PAGE_TITLE,
            topic: policy.topic(),
            messages,
            usage,
        }
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "Ti",
        Role::Assistant => "Asistent",
        Role::System => "Sistem",
    }
}

/// Markdown to HTML, with scripts, event handlers and other unsafe markup
/// stripped.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    ammonia::clean(&out)
}

pub fn render_page(view: &PageView<'_>) -> Result<String, tinytemplate::error::Error> {
    let mut tt = TinyTemplate::new();
    tt.add_formatter("unescaped", tinytemplate::format_unescaped);
    tt.add_template("page", PAGE)?;
    tt.render("page", view)
}
