//! Startup configuration.
//!
//! Everything here is resolved once before the server binds and is immutable
//! afterwards. The only required value is the API key; it may come from the
//! command line, the `GROQ_API_KEY` environment variable, or a secrets file.

use crate::history::DEFAULT_MAX_MESSAGES;
use crate::llm::openai::{OpenAiConfig, GROQ_BASE_URL};
use crate::prompt::{PromptPolicy, DEFAULT_TOPIC};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f32 = 0.4;

/// Shown when no API key can be found. Startup stops here.
pub const MISSING_API_KEY_MESSAGE: &str =
    "Manjka GROQ_API_KEY. Dodaj ga v nastavitve skrivnosti.";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,
    #[error("failed to read secrets file {}: {source}", path.display())]
    SecretsIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid secrets file {}: {source}", path.display())]
    SecretsParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Command line arguments for the topic-chat binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "topic-chat", about = "Single-topic chat widget")]
pub struct Args {
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// TOML file holding `GROQ_API_KEY`; ignored when it does not exist.
    #[arg(long, default_value = "secrets.toml")]
    pub secrets_file: PathBuf,
    #[arg(long, env = "TOPIC_CHAT_BASE_URL", default_value = GROQ_BASE_URL)]
    pub base_url: String,
    #[arg(long, env = "TOPIC_CHAT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,
    /// Upper bound on stored messages, instruction included. At least 1.
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGES, value_parser = parse_max_messages)]
    pub max_messages: usize,
    #[arg(long, env = "TOPIC_CHAT_TOPIC", default_value = DEFAULT_TOPIC)]
    pub topic: String,
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 8501)]
    pub port: u16,
}

#[derive(Deserialize)]
struct Secrets {
    #[serde(rename = "GROQ_API_KEY")]
    api_key: Option<String>,
}

/// Resolved, read-only configuration shared by every session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub llm: OpenAiConfig,
    pub model: String,
    pub temperature: f32,
    pub max_messages: usize,
    pub policy: PromptPolicy,
    pub bind: String,
}

impl Args {
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let api_key = match self.api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => key,
            None => read_secrets_key(&self.secrets_file)?.ok_or(ConfigError::MissingApiKey)?,
        };
        Ok(Settings {
            llm: OpenAiConfig {
                api_key,
                base_url: self.base_url,
            },
            model: self.model,
            temperature: self.temperature,
            max_messages: self.max_messages,
            policy: PromptPolicy::new(self.topic),
            bind: format!("{}:{}", self.host, self.port),
        })
    }
}

fn parse_max_messages(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn read_secrets_key(path: &Path) -> Result<Option<String>, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::SecretsIo {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let secrets: Secrets = toml::from_str(&text).map_err(|source| ConfigError::SecretsParse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded secrets file");
    Ok(secrets.api_key.filter(|k| !k.trim().is_empty()))
}
