use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Default bound on any single collaborator invocation.
const DEFAULT_COLLABORATOR_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub embedding_model: String,
    /// HTTP mail relay used for email interview dispatch.
    pub mail_relay_url: String,
    pub mail_relay_token: String,
    /// Sender address stamped on outgoing interview emails.
    pub interview_from_address: String,
    /// Call-triggering service used for phone interview dispatch.
    pub call_service_url: String,
    pub call_service_token: String,
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
    /// Upper bound in seconds for each collaborator call.
    pub collaborator_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let llm_api_key =
            env::var("LLM_API_KEY").context("LLM_API_KEY environment variable is required")?;

        let llm_base_url =
            env::var("LLM_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let llm_model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let embedding_model =
            env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());

        let mail_relay_url = env::var("MAIL_RELAY_URL")
            .context("MAIL_RELAY_URL environment variable is required")?;

        let mail_relay_token = env::var("MAIL_RELAY_TOKEN")
            .context("MAIL_RELAY_TOKEN environment variable is required")?;

        let interview_from_address = env::var("INTERVIEW_FROM_ADDRESS")
            .context("INTERVIEW_FROM_ADDRESS environment variable is required")?;

        let call_service_url = env::var("CALL_SERVICE_URL")
            .context("CALL_SERVICE_URL environment variable is required")?;

        let call_service_token = env::var("CALL_SERVICE_TOKEN")
            .context("CALL_SERVICE_TOKEN environment variable is required")?;

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("newsdesk.db"));

        let collaborator_timeout_secs =
            parse_timeout_secs(env::var("COLLABORATOR_TIMEOUT_SECS").ok());

        Ok(Config {
            llm_api_key,
            llm_base_url,
            llm_model,
            embedding_model,
            mail_relay_url,
            mail_relay_token,
            interview_from_address,
            call_service_url,
            call_service_token,
            database_path,
            collaborator_timeout_secs,
        })
    }
}

/// Parse COLLABORATOR_TIMEOUT_SECS from an optional string value.
///
/// Falls back to the default for missing, unparseable, or zero values; a
/// zero timeout would make every collaborator call fail immediately.
pub fn parse_timeout_secs(value: Option<String>) -> u64 {
    value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .unwrap_or(DEFAULT_COLLABORATOR_TIMEOUT_SECS)
}
