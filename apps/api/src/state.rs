use std::sync::Arc;

use crate::adaptation::pipeline::AdaptationSettings;
use crate::config::Config;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Generation backend. `LlmClient` in production; scripted in tests.
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn adaptation_settings(&self) -> AdaptationSettings {
        AdaptationSettings {
            max_concurrency: self.config.max_concurrency,
        }
    }
}
