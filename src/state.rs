use std::sync::Arc;

use crate::config::Config;
use crate::quiz::AttemptManager;
use crate::store::QuizStore;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    pub attempts: AttemptManager,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn QuizStore>, config: Config) -> Self {
        let attempts = AttemptManager::new(store.clone(), config.auto_submit_tick);
        Self { store, attempts, config }
    }
}

impl FromRef<AppState> for Arc<dyn QuizStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for AttemptManager {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
