//! crates/assessment_core/src/ports.rs
//!
//! Defines the service contracts (traits) the passage manager depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of whichever LLM or HTTP backend actually does the work.

use async_trait::async_trait;

use crate::domain::{GeneratedPassage, PassageRequest};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, LLM).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Backend returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("Unsupported language: {0}")]
    Unsupported(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait LanguageIdentificationService: Send + Sync {
    /// Maps a free-form language descriptor ("Français", "中文", "Spanish")
    /// to a language code. The answer is validated by the caller.
    async fn identify_language(&self, descriptor: &str) -> PortResult<String>;
}

#[async_trait]
pub trait PassageGenerationService: Send + Sync {
    /// Produces a new reading passage in the requested language.
    async fn generate_passage(&self, request: &PassageRequest) -> PortResult<GeneratedPassage>;
}
