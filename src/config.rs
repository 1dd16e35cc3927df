use clap::Parser;
use std::time::Duration;

use crate::error::ConfigError;
use crate::ledger::LedgerMode;
use crate::rate_limit::RateLimitPolicy;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a Shami Arabic language partner/teacher for English-speaking students. \
Please provide brief and concise responses when teaching. Focus on key phrases, simple explanations, and avoid unnecessary details. \
When using Arabic words, write them in Arabic along with transliteration. Keep your responses to a few sentences.";

// CLI argument structure
#[derive(Parser, Clone)]
#[command(name = "chat-gateway")]
#[command(about = "Rate limited chat proxy for an OpenAI-compatible completion API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Accepted requests per window, per caller
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Rate limit window in seconds (3 hours)
    #[arg(long, default_value_t = 10_800, value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_window: u64,

    // Where the rate limit ledger is kept
    #[arg(long, value_enum, default_value_t = LedgerMode::Cookie)]
    pub ledger: LedgerMode,

    // Base url of the completion api
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub upstream_url: String,

    #[arg(long, default_value = "gpt-4")]
    pub model: String,

    // Upstream request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub upstream_timeout: u64,

    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    // Fallback when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.rate_limit, Duration::from_secs(self.rate_window))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }

    pub fn api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or(ConfigError::MissingApiKey)
    }
}
