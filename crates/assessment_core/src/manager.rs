//! crates/assessment_core/src/manager.rs
//!
//! The passage manager: resolves a language, serves the cached passage for it,
//! and generates a new one when nothing is cached or the caller asks for it.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{Mirrored, PassageStore, SessionTier, RECENT_PASSAGES};
use crate::domain::{CacheStats, GeneratedPassage, LanguageCode, Passage, PassageRequest};
use crate::error::{GenerationError, PassageUnavailableError};
use crate::languages;
use crate::ports::PassageGenerationService;
use crate::resolver::LanguageResolver;

/// Serves one stable passage per language for the lifetime of its session tier.
///
/// The durable [`PassageStore`] and the [`LanguageResolver`] are shared; the
/// session tier belongs to this manager alone. Use [`PassageManager::new_session`]
/// to start another session over the same store. The session tier is checked
/// against the durable tier on every read, so regenerations and clears made
/// through another session show up here on the next call.
///
/// No lock is held while the generator runs, so two concurrent calls for the
/// same uncached language both generate and the later write wins in both tiers.
pub struct PassageManager {
    resolver: Arc<LanguageResolver>,
    generator: Arc<dyn PassageGenerationService>,
    store: Arc<PassageStore>,
    session: SessionTier,
}

impl PassageManager {
    pub fn new(
        resolver: Arc<LanguageResolver>,
        generator: Arc<dyn PassageGenerationService>,
        store: Arc<PassageStore>,
    ) -> Self {
        Self {
            resolver,
            generator,
            store,
            session: SessionTier::new(),
        }
    }

    /// A manager over the same resolver, generator and durable store with an empty session tier.
    pub fn new_session(&self) -> Self {
        Self::new(
            Arc::clone(&self.resolver),
            Arc::clone(&self.generator),
            Arc::clone(&self.store),
        )
    }

    /// Resolves a language descriptor without touching either cache tier.
    pub async fn resolve(&self, language: &str) -> Result<LanguageCode, PassageUnavailableError> {
        self.resolver
            .resolve(language)
            .await
            .map_err(|e| PassageUnavailableError::new(language, e))
    }

    pub async fn get_passage(
        &self,
        language: &str,
        force_new: bool,
    ) -> Result<Passage, PassageUnavailableError> {
        let code = self.resolve(language).await.inspect_err(|e| {
            warn!("Language resolution failed: {}", e);
        })?;

        if !force_new {
            match self.session.mirror(&self.store, &code).await {
                Mirrored::Current(passage) => {
                    debug!("Session cache hit for '{}'", code);
                    return Ok(passage);
                }
                Mirrored::Refreshed(passage) => {
                    debug!("Durable cache hit for '{}', mirrored into session", code);
                    return Ok(passage);
                }
                Mirrored::Absent { dropped: true } => {
                    debug!("'{}' was cleared elsewhere, dropped the session copy", code);
                }
                Mirrored::Absent { dropped: false } => {}
            }
        }

        let passage = self.generate(language, code, force_new).await?;
        self.session.record(&self.store, passage.clone()).await;
        info!("Cached passage {} for '{}'", passage.id, passage.language_code);
        Ok(passage)
    }

    /// Always generates; identical to `get_passage(language, true)`.
    pub async fn get_new_passage(&self, language: &str) -> Result<Passage, PassageUnavailableError> {
        self.get_passage(language, true).await
    }

    pub async fn has_passage(&self, code: &LanguageCode) -> bool {
        self.store.contains(code).await
    }

    pub async fn list_available_languages(&self) -> BTreeSet<LanguageCode> {
        self.store.languages().await
    }

    /// Generates a passage without reading or writing either cache tier.
    ///
    /// With a `target` code, `language` is not resolved and only names the
    /// language in the generation prompt.
    pub async fn generate_uncached(
        &self,
        language: &str,
        target: Option<LanguageCode>,
    ) -> Result<Passage, PassageUnavailableError> {
        let code = match target {
            Some(code) => code,
            None => self.resolve(language).await.inspect_err(|e| {
                warn!("Language resolution failed: {}", e);
            })?,
        };
        self.generate(language, code, false).await
    }

    /// Drops `code` from the durable tier and this session tier. Other sessions
    /// drop their copy on their next read. Clearing an absent language is a no-op.
    pub async fn clear_language_cache(&self, code: &LanguageCode) {
        if self.session.evict(&self.store, code).await {
            info!("Cleared cached passage for '{}'", code);
        }
    }

    /// Drops `code` from this session tier only.
    pub(crate) async fn forget_session_entry(&self, code: &LanguageCode) {
        self.session.remove(code).await;
    }

    /// Empties this manager's session tier; the durable store is untouched.
    pub async fn clear_session_cache(&self) {
        self.session.clear().await;
        info!("Session passage cache cleared");
    }

    pub async fn cache_stats(&self) -> CacheStats {
        CacheStats {
            total_cached: self.store.len().await,
            session_cached: self.session.len().await,
            languages: self.store.languages().await.into_iter().collect(),
            recent_passages: self.store.recent(RECENT_PASSAGES).await,
        }
    }
}

impl PassageManager {
    async fn generate(
        &self,
        language: &str,
        code: LanguageCode,
        regenerate: bool,
    ) -> Result<Passage, PassageUnavailableError> {
        let request = PassageRequest {
            language_name: languages::prompt_name(&code, language),
            language_code: code,
            regenerate,
        };
        info!(
            "Generating passage for '{}' ({}), regenerate={}",
            request.language_name, request.language_code, regenerate
        );

        let generated = match self.generator.generate_passage(&request).await {
            Ok(generated) => validate(generated),
            Err(e) => Err(GenerationError::from(e)),
        }
        .map_err(|e| {
            warn!("Passage generation for '{}' failed: {}", request.language_code, e);
            PassageUnavailableError::new(language, e)
        })?;

        Ok(Passage::from_generated(generated, request.language_code))
    }
}

fn validate(generated: GeneratedPassage) -> Result<GeneratedPassage, GenerationError> {
    if generated.text.trim().is_empty() {
        return Err(GenerationError::MissingField("text"));
    }
    if generated.title.trim().is_empty() {
        return Err(GenerationError::MissingField("title"));
    }
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PassageFailure, ResolutionError};
    use crate::ports::{LanguageIdentificationService, PortError, PortResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct TableIdentifier {
        table: HashMap<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageIdentificationService for TableIdentifier {
        async fn identify_language(&self, descriptor: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .get(descriptor)
                .map(|code| code.to_string())
                .ok_or_else(|| PortError::Unsupported(descriptor.to_string()))
        }
    }

    /// Numbers each passage it writes; can be switched into a failing mode.
    #[derive(Default)]
    struct CountingGenerator {
        generated: AtomicUsize,
        failing: AtomicBool,
        blank_title: AtomicBool,
        last_request: std::sync::Mutex<Option<PassageRequest>>,
    }

    #[async_trait]
    impl PassageGenerationService for CountingGenerator {
        async fn generate_passage(&self, request: &PassageRequest) -> PortResult<GeneratedPassage> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::Unexpected("backend unavailable".to_string()));
            }
            let n = self.generated.fetch_add(1, Ordering::SeqCst) + 1;
            let title = if self.blank_title.load(Ordering::SeqCst) {
                " ".to_string()
            } else {
                format!("{} passage #{n}", request.language_name)
            };
            Ok(GeneratedPassage {
                text: format!("A natural reading passage in {}.", request.language_name),
                title,
                estimated_duration: 60,
            })
        }
    }

    struct Fixture {
        identifier: Arc<TableIdentifier>,
        generator: Arc<CountingGenerator>,
        manager: PassageManager,
    }

    fn fixture() -> Fixture {
        let identifier = Arc::new(TableIdentifier {
            table: HashMap::from([("English", "en"), ("Français", "fr"), ("Deutsch", "de")]),
            calls: AtomicUsize::new(0),
        });
        let generator = Arc::new(CountingGenerator::default());
        let resolver = Arc::new(LanguageResolver::new(identifier.clone()));
        let manager = PassageManager::new(resolver, generator.clone(), Arc::new(PassageStore::new()));
        Fixture {
            identifier,
            generator,
            manager,
        }
    }

    fn code(s: &str) -> LanguageCode {
        LanguageCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_english_scenario() {
        let f = fixture();

        let first = f.manager.get_passage("English", false).await.unwrap();
        assert_eq!(first.language_code.as_str(), "en");
        assert!(!first.text.is_empty());
        assert!(!first.title.is_empty());

        let again = f.manager.get_passage("English", false).await.unwrap();
        assert_eq!(again.id, first.id);

        let fresh = f.manager.get_new_passage("English").await.unwrap();
        assert_ne!(fresh.id, first.id);

        f.manager.clear_language_cache(&code("en")).await;
        assert!(!f.manager.has_passage(&code("en")).await);
    }

    #[tokio::test]
    async fn test_repeated_calls_return_identical_passage() {
        let f = fixture();
        let a = f.manager.get_passage("fr", false).await.unwrap();
        let b = f.manager.get_passage("FR", false).await.unwrap();
        let c = f.manager.get_passage("Français", false).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(f.generator.generated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_forced_passage_becomes_the_cached_one() {
        let f = fixture();
        let original = f.manager.get_passage("de", false).await.unwrap();
        let forced = f.manager.get_passage("de", true).await.unwrap();
        let after = f.manager.get_passage("de", false).await.unwrap();

        assert_ne!(forced.id, original.id);
        assert_eq!(after.id, forced.id);
    }

    #[tokio::test]
    async fn test_clear_language_cache_is_idempotent() {
        let f = fixture();
        f.manager.get_passage("es", false).await.unwrap();

        f.manager.clear_language_cache(&code("es")).await;
        f.manager.clear_language_cache(&code("es")).await;
        assert!(!f.manager.has_passage(&code("es")).await);

        // A cleared language is generated afresh rather than served from the session tier.
        f.manager.get_passage("es", false).await.unwrap();
        assert_eq!(f.generator.generated.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_regeneration_keeps_prior_passage() {
        let f = fixture();
        let cached = f.manager.get_passage("it", false).await.unwrap();

        f.generator.failing.store(true, Ordering::SeqCst);
        let err = f.manager.get_new_passage("it").await.unwrap_err();
        assert_eq!(err.language, "it");
        assert!(matches!(
            err.cause,
            PassageFailure::Generation(GenerationError::Service(PortError::Unexpected(_)))
        ));

        let after = f.manager.get_passage("it", false).await.unwrap();
        assert_eq!(after.id, cached.id);
        assert!(f.manager.has_passage(&code("it")).await);
    }

    #[tokio::test]
    async fn test_clear_session_cache_keeps_durable_tier() {
        let f = fixture();
        let cached = f.manager.get_passage("pt", false).await.unwrap();

        f.manager.clear_session_cache().await;
        assert!(f.manager.has_passage(&code("pt")).await);
        assert_eq!(f.manager.cache_stats().await.session_cached, 0);

        let again = f.manager.get_passage("pt", false).await.unwrap();
        assert_eq!(again.id, cached.id);
        assert_eq!(f.manager.cache_stats().await.session_cached, 1);
        assert_eq!(f.generator.generated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolution_failure_caches_nothing() {
        let f = fixture();
        let err = f.manager.get_passage("Klingon", false).await.unwrap_err();

        assert!(err.is_resolution());
        assert!(matches!(
            err.cause,
            PassageFailure::Resolution(ResolutionError::Service { .. })
        ));
        assert!(f.manager.list_available_languages().await.is_empty());
        assert_eq!(f.generator.generated.load(Ordering::SeqCst), 0);
        assert_eq!(f.identifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_incomplete_generator_output_is_rejected() {
        let f = fixture();
        f.generator.blank_title.store(true, Ordering::SeqCst);

        let err = f.manager.get_passage("English", false).await.unwrap_err();
        assert!(matches!(
            err.cause,
            PassageFailure::Generation(GenerationError::MissingField("title"))
        ));
        assert!(!f.manager.has_passage(&code("en")).await);
    }

    #[tokio::test]
    async fn test_generator_receives_display_name_and_flag() {
        let f = fixture();
        f.manager.get_new_passage("Deutsch").await.unwrap();

        let request = f.generator.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.language_code.as_str(), "de");
        assert_eq!(request.language_name, "German");
        assert!(request.regenerate);
    }

    #[tokio::test]
    async fn test_sessions_share_the_durable_store() {
        let f = fixture();
        let first = f.manager.get_passage("en", false).await.unwrap();

        let other = f.manager.new_session();
        assert_eq!(other.cache_stats().await.session_cached, 0);
        assert_eq!(other.get_passage("en", false).await.unwrap().id, first.id);

        // A regeneration through another session is the latest write for every session.
        let regenerated = other.get_new_passage("en").await.unwrap();
        assert_eq!(
            f.manager.get_passage("en", false).await.unwrap().id,
            regenerated.id
        );
        assert_eq!(f.generator.generated.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_through_another_session_reaches_this_one() {
        let f = fixture();
        let cleared = f.manager.get_passage("es", false).await.unwrap();

        let other = f.manager.new_session();
        other.clear_language_cache(&code("es")).await;
        assert!(!f.manager.has_passage(&code("es")).await);

        let fresh = f.manager.get_passage("es", false).await.unwrap();
        assert_ne!(fresh.id, cleared.id);
        assert!(f.manager.has_passage(&code("es")).await);
        assert_eq!(f.manager.cache_stats().await.session_cached, 1);
    }

    #[tokio::test]
    async fn test_generate_uncached_leaves_both_tiers_alone() {
        let f = fixture();
        let cached = f.manager.get_passage("fr", false).await.unwrap();

        let loose = f.manager.generate_uncached("Français", None).await.unwrap();
        assert_eq!(loose.language_code.as_str(), "fr");
        assert_ne!(loose.id, cached.id);
        assert_eq!(f.manager.get_passage("fr", false).await.unwrap().id, cached.id);

        let targeted = f
            .manager
            .generate_uncached("japanese", Some(code("ja")))
            .await
            .unwrap();
        assert_eq!(targeted.language_code.as_str(), "ja");
        assert!(!f.manager.has_passage(&code("ja")).await);
        // The target code skips resolution entirely.
        assert_eq!(f.identifier.calls.load(Ordering::SeqCst), 1);

        let stats = f.manager.cache_stats().await;
        assert_eq!(stats.total_cached, 1);
        assert_eq!(stats.session_cached, 1);
    }

    #[tokio::test]
    async fn test_generate_uncached_names_unknown_codes_from_the_input() {
        let f = fixture();
        f.manager
            .generate_uncached("sindarin", Some(code("sjn")))
            .await
            .unwrap();

        let request = f.generator.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.language_name, "Sindarin");
        assert!(!request.regenerate);
    }

    #[tokio::test]
    async fn test_cache_stats_reports_both_tiers() {
        let f = fixture();
        for lang in ["en", "fr", "de"] {
            f.manager.get_passage(lang, false).await.unwrap();
        }
        f.manager.get_new_passage("en").await.unwrap();
        f.manager.clear_session_cache().await;
        f.manager.get_passage("fr", false).await.unwrap();

        let stats = f.manager.cache_stats().await;
        assert_eq!(stats.total_cached, 3);
        assert_eq!(stats.session_cached, 1);
        assert_eq!(stats.languages, vec![code("de"), code("en"), code("fr")]);

        let order: Vec<&str> = stats
            .recent_passages
            .iter()
            .map(|p| p.language_code.as_str())
            .collect();
        assert_eq!(order, vec!["fr", "de", "en"]);
    }

    #[tokio::test]
    async fn test_concurrent_callers_settle_on_one_cached_passage() {
        let f = fixture();
        let (a, b) = tokio::join!(
            f.manager.get_passage("sv", false),
            f.manager.get_passage("sv", false)
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let cached = f.manager.get_passage("sv", false).await.unwrap();
        assert!(cached.id == a.id || cached.id == b.id);
        assert_eq!(f.manager.cache_stats().await.total_cached, 1);
    }
}
