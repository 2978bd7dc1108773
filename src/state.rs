use crate::{config::Config, services::generator::QuizGenerator};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generator: QuizGenerator,
}

impl AppState {
    /// Wires the generator from the configured budget and pool size.
    pub fn new(
        config: Config,
        completion: std::sync::Arc<dyn crate::services::completion::CompletionService>,
    ) -> Self {
        let generator = QuizGenerator::new(
            completion,
            config.max_inflight_generations,
            config.generation_timeout,
        );
        Self { config, generator }
    }
}

impl FromRef<AppState> for QuizGenerator {
    fn from_ref(state: &AppState) -> Self {
        state.generator.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
