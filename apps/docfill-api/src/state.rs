//! Application state and environment configuration

use std::sync::Arc;

use docfill_llm::{AiStudioClient, LlmClient, DEFAULT_MODEL};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub enable_dev_routes: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let api_key = std::env::var("AI_STUDIO_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let model =
            std::env::var("AI_STUDIO_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let enable_dev_routes = std::env::var("ENABLE_DEV_ROUTES")
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            api_key,
            model,
            enable_dev_routes,
        }
    }
}

pub struct AppState {
    pub config: Config,
    /// Present only when an API key is configured.
    pub llm: Option<Arc<dyn LlmClient>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let llm: Option<Arc<dyn LlmClient>> = config
            .api_key
            .clone()
            .map(|key| Arc::new(AiStudioClient::new(key, config.model.clone())) as _);
        Self { config, llm }
    }
}
