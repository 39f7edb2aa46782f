//! crates/assessment_core/src/error.rs
//!
//! Error taxonomy for language resolution and passage generation.

use crate::ports::PortError;

/// A language descriptor could not be mapped to a valid code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Language descriptor is empty")]
    EmptyInput,

    /// The identification service answered with something that is not a 2-letter code.
    #[error("Invalid language code returned for '{input}': '{returned}'")]
    InvalidCode { input: String, returned: String },

    #[error("Unable to determine language code for '{input}': {source}")]
    Service {
        input: String,
        #[source]
        source: PortError,
    },
}

/// The generation backend failed to produce a well-formed passage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("Generated passage is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Passage generation failed: {0}")]
    Service(#[from] PortError),
}

/// The inner cause of a [`PassageUnavailableError`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PassageFailure {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// The single error surfaced by the passage manager.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unable to provide passage for {language}: {cause}")]
pub struct PassageUnavailableError {
    /// The caller's original language input, untouched.
    pub language: String,
    #[source]
    pub cause: PassageFailure,
}

impl PassageUnavailableError {
    pub fn new(language: impl Into<String>, cause: impl Into<PassageFailure>) -> Self {
        Self {
            language: language.into(),
            cause: cause.into(),
        }
    }

    pub fn is_resolution(&self) -> bool {
        matches!(self.cause, PassageFailure::Resolution(_))
    }
}
