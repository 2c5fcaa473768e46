//! Process configuration from the environment.

use anyhow::{Context, Result};

/// Server configuration loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,

    /// Required: language model, vision, and ASR all run through OpenAI.
    pub openai_api_key: String,

    /// Optional: comment harvesting is disabled when absent.
    pub apify_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("PORT must be a number")?;

        let openai_api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;

        let apify_token = std::env::var("APIFY_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(Self {
            port,
            openai_api_key,
            apify_token,
        })
    }
}
