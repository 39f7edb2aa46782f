pub mod cache;
pub mod domain;
pub mod error;
pub mod languages;
pub mod manager;
pub mod ports;
pub mod resolver;
pub mod session;

pub use cache::{Mirrored, PassageStore, SessionTier};
pub use domain::{CacheStats, GeneratedPassage, LanguageCode, Passage, PassageRequest, PassageSummary};
pub use error::{GenerationError, PassageFailure, PassageUnavailableError, ResolutionError};
pub use manager::PassageManager;
pub use ports::{LanguageIdentificationService, PassageGenerationService, PortError, PortResult};
pub use resolver::LanguageResolver;
pub use session::{SessionLimits, SessionRegistry, SessionScope};
