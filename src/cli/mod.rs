use clap::Parser;
use crate::llm::DEFAULT_GEMINI_BASE_URL;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Comma-separated API keys for the Gemini provider, tried in order when a call fails
    #[arg(long, env = "API_KEY", default_value = "", hide_env_values = true)]
    pub api_keys: String,

    /// Base URL of the Gemini REST API (models are appended as /models/{model}:generateContent)
    #[arg(long, env = "CHAT_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub chat_base_url: String,

    /// Sampling temperature sent with every request
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.0")]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "60")]
    pub chat_timeout_secs: u64,

    // --- Retry Args ---
    /// Pause between failed attempts, in milliseconds
    #[arg(long, env = "RETRY_DELAY_MS", default_value = "1500")]
    pub retry_delay_ms: u64,

    /// Optional ceiling on attempts per turn. Without it every model × key pair is tried.
    #[arg(long, env = "MAX_ATTEMPTS")]
    pub max_attempts: Option<usize>,

    // --- History Store Args ---
    /// History store type (file, memory)
    #[arg(long, env = "STORE_TYPE", default_value = "file")]
    pub store_type: String,

    /// Profile directory for the file store (defaults to ~/.dcet-chat)
    #[arg(long, env = "STORE_PATH")]
    pub store_path: Option<String>,

    /// Saved chat is discarded at startup once this many hours have passed since the last clear
    #[arg(
        long,
        env = "HISTORY_EXPIRY_HOURS",
        default_value = "24",
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub history_expiry_hours: i64,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
