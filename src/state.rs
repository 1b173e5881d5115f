use std::sync::Arc;

use crate::config::Config;
use crate::llm::{CompletionModel, GeminiLLM};

/// Immutable per-process state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub model: Arc<dyn CompletionModel>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let model = Arc::new(GeminiLLM::new(&config.model)?);
        Ok(Self::with_model(config, model))
    }

    pub fn with_model(config: Config, model: Arc<dyn CompletionModel>) -> Self {
        Self {
            config: Arc::new(config),
            model,
        }
    }
}
