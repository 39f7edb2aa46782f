//! crates/assessment_core/src/resolver.rs
//!
//! Turns free-form language input into a [`LanguageCode`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::LanguageCode;
use crate::error::ResolutionError;
use crate::ports::LanguageIdentificationService;

/// Resolves language descriptors, delegating anything that is not already a
/// 2-letter code to a [`LanguageIdentificationService`].
///
/// Successful lookups are remembered for the resolver's lifetime so the same
/// descriptor always maps to the same code, whatever the backend does later.
pub struct LanguageResolver {
    identifier: Arc<dyn LanguageIdentificationService>,
    resolved: RwLock<HashMap<String, LanguageCode>>,
}

impl LanguageResolver {
    pub fn new(identifier: Arc<dyn LanguageIdentificationService>) -> Self {
        Self {
            identifier,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, input: &str) -> Result<LanguageCode, ResolutionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ResolutionError::EmptyInput);
        }

        // Fast path: already a code, no backend call.
        if let Some(code) = LanguageCode::from_two_letter(trimmed) {
            return Ok(code);
        }

        let key = trimmed.to_lowercase();
        if let Some(code) = self.resolved.read().await.get(&key) {
            debug!("Language '{}' resolved from memo to '{}'", trimmed, code);
            return Ok(code.clone());
        }

        let answer = self
            .identifier
            .identify_language(trimmed)
            .await
            .map_err(|source| ResolutionError::Service {
                input: trimmed.to_string(),
                source,
            })?;

        let returned = answer.trim().to_lowercase();
        let code = match LanguageCode::from_two_letter(&returned) {
            Some(code) => code,
            None => {
                warn!("Identification service returned '{}' for '{}'", answer, trimmed);
                return Err(ResolutionError::InvalidCode {
                    input: trimmed.to_string(),
                    returned: answer,
                });
            }
        };

        // First answer wins if two lookups for the same descriptor raced.
        let mut resolved = self.resolved.write().await;
        let code = resolved.entry(key).or_insert(code).clone();
        debug!("Language '{}' resolved to '{}'", trimmed, code);
        Ok(code)
    }
}
