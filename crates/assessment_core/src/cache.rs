//! crates/assessment_core/src/cache.rs
//!
//! The two cache tiers behind the passage manager.
//!
//! [`PassageStore`] is the durable tier: one per process, shared by every
//! manager through an `Arc`. [`SessionTier`] is owned by a single manager and
//! lives exactly as long as the assessment session it belongs to.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::RwLock;

use crate::domain::{LanguageCode, Passage, PassageSummary};

/// How many writes `recent` reports by default.
pub const RECENT_PASSAGES: usize = 5;

#[derive(Debug)]
struct StoredPassage {
    passage: Passage,
    /// Monotonic write order; regenerating a language bumps it.
    written: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<LanguageCode, StoredPassage>,
    next_write: u64,
}

/// Durable tier: the latest passage per language for the lifetime of the process.
#[derive(Debug, Default)]
pub struct PassageStore {
    inner: RwLock<StoreInner>,
}

impl PassageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, code: &LanguageCode) -> Option<Passage> {
        self.inner
            .read()
            .await
            .entries
            .get(code)
            .map(|stored| stored.passage.clone())
    }

    /// Replaces whatever was stored for the passage's language.
    pub async fn put(&self, passage: Passage) {
        let mut inner = self.inner.write().await;
        let written = inner.next_write;
        inner.next_write += 1;
        inner
            .entries
            .insert(passage.language_code.clone(), StoredPassage { passage, written });
    }

    /// Returns true if an entry was removed.
    pub async fn remove(&self, code: &LanguageCode) -> bool {
        self.inner.write().await.entries.remove(code).is_some()
    }

    pub async fn contains(&self, code: &LanguageCode) -> bool {
        self.inner.read().await.entries.contains_key(code)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn languages(&self) -> BTreeSet<LanguageCode> {
        self.inner.read().await.entries.keys().cloned().collect()
    }

    /// The `limit` most recently written entries, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<PassageSummary> {
        let inner = self.inner.read().await;
        let mut stored: Vec<&StoredPassage> = inner.entries.values().collect();
        stored.sort_by_key(|s| s.written);
        let skip = stored.len().saturating_sub(limit);
        stored
            .into_iter()
            .skip(skip)
            .map(|s| s.passage.summary())
            .collect()
    }
}

/// What [`SessionTier::mirror`] found for a language.
#[derive(Debug, Clone, PartialEq)]
pub enum Mirrored {
    /// The session already held the durable tier's current passage.
    Current(Passage),
    /// The session entry was missing or stale and now matches the durable tier.
    Refreshed(Passage),
    /// The durable tier has nothing for the language. `dropped` is true when a
    /// leftover session entry had to be removed.
    Absent { dropped: bool },
}

/// Session tier: mirrors the durable tier for the languages this session has seen.
///
/// Every operation that touches both tiers holds this tier's write lock while it
/// talks to the store, so writes through one session land in the same order in both.
/// The lock order is always session, then store.
#[derive(Debug, Default)]
pub struct SessionTier {
    entries: RwLock<HashMap<LanguageCode, Passage>>,
}

impl SessionTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, code: &LanguageCode) -> Option<Passage> {
        self.entries.read().await.get(code).cloned()
    }

    /// Brings this tier's entry for `code` in line with the durable tier.
    pub async fn mirror(&self, store: &PassageStore, code: &LanguageCode) -> Mirrored {
        let mut entries = self.entries.write().await;
        match store.get(code).await {
            Some(current) => {
                if entries.get(code).is_some_and(|held| held.id == current.id) {
                    Mirrored::Current(current)
                } else {
                    entries.insert(code.clone(), current.clone());
                    Mirrored::Refreshed(current)
                }
            }
            None => Mirrored::Absent {
                dropped: entries.remove(code).is_some(),
            },
        }
    }

    /// Writes `passage` to the durable tier and this tier as one step.
    pub async fn record(&self, store: &PassageStore, passage: Passage) {
        let mut entries = self.entries.write().await;
        store.put(passage.clone()).await;
        entries.insert(passage.language_code.clone(), passage);
    }

    /// Removes `code` from the durable tier and this tier as one step.
    /// Returns true if the durable tier held an entry.
    pub async fn evict(&self, store: &PassageStore, code: &LanguageCode) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(code);
        store.remove(code).await
    }

    /// Drops this tier's entry only. Returns true if there was one.
    pub async fn remove(&self, code: &LanguageCode) -> bool {
        self.entries.write().await.remove(code).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
