//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use assessment_core::{
    LanguageIdentificationService, LanguageResolver, PassageGenerationService, PassageManager,
    PassageStore, SessionLimits, SessionRegistry, SessionScope,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Wires the passage manager from the two ports and the configured session scope.
    pub fn new(
        config: Arc<Config>,
        language_adapter: Arc<dyn LanguageIdentificationService>,
        passage_adapter: Arc<dyn PassageGenerationService>,
    ) -> Self {
        let sessions = build_sessions(
            config.session_scope,
            config.session_limits,
            language_adapter,
            passage_adapter,
        );
        Self {
            config,
            sessions: Arc::new(sessions),
        }
    }
}

fn build_sessions(
    scope: SessionScope,
    limits: SessionLimits,
    language_adapter: Arc<dyn LanguageIdentificationService>,
    passage_adapter: Arc<dyn PassageGenerationService>,
) -> SessionRegistry {
    let resolver = Arc::new(LanguageResolver::new(language_adapter));
    let store = Arc::new(PassageStore::new());
    SessionRegistry::with_limits(
        scope,
        limits,
        PassageManager::new(resolver, passage_adapter, store),
    )
}
