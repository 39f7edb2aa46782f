//! crates/assessment_core/src/session.rs
//!
//! Decides which [`PassageManager`] (and therefore which session tier) serves a request.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::LanguageCode;
use crate::manager::PassageManager;

/// How long a session tier lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScope {
    /// One session tier for the whole process.
    Application,
    /// One session tier per assessment attempt id.
    Attempt,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session scope '{0}', expected 'application' or 'attempt'")]
pub struct ParseSessionScopeError(String);

impl FromStr for SessionScope {
    type Err = ParseSessionScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "application" | "app" => Ok(Self::Application),
            "attempt" => Ok(Self::Attempt),
            other => Err(ParseSessionScopeError(other.to_string())),
        }
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => f.write_str("application"),
            Self::Attempt => f.write_str("attempt"),
        }
    }
}

/// Bounds on the attempt sessions a [`SessionRegistry`] keeps alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// An attempt unused for longer than this is forgotten.
    pub idle_ttl: Duration,
    /// Starting a session beyond this many evicts the least recently used one.
    pub max_attempts: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(60 * 60),
            max_attempts: 1024,
        }
    }
}

struct AttemptSession {
    manager: Arc<PassageManager>,
    last_used: Instant,
}

/// Hands out managers according to a [`SessionScope`].
///
/// Requests without an attempt id, and every request under
/// [`SessionScope::Application`], share the application manager.
pub struct SessionRegistry {
    scope: SessionScope,
    limits: SessionLimits,
    shared: Arc<PassageManager>,
    attempts: RwLock<HashMap<Uuid, AttemptSession>>,
}

impl SessionRegistry {
    pub fn new(scope: SessionScope, shared: PassageManager) -> Self {
        Self::with_limits(scope, SessionLimits::default(), shared)
    }

    pub fn with_limits(scope: SessionScope, limits: SessionLimits, shared: PassageManager) -> Self {
        Self {
            scope,
            limits,
            shared: Arc::new(shared),
            attempts: RwLock::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> SessionScope {
        self.scope
    }

    fn attempt_key(&self, attempt: Option<Uuid>) -> Option<Uuid> {
        match (self.scope, attempt) {
            (SessionScope::Attempt, Some(id)) => Some(id),
            _ => None,
        }
    }

    /// The manager that serves `attempt`, starting its session if needed.
    pub async fn manager_for(&self, attempt: Option<Uuid>) -> Arc<PassageManager> {
        let Some(attempt_id) = self.attempt_key(attempt) else {
            return Arc::clone(&self.shared);
        };

        let mut attempts = self.attempts.write().await;
        let now = Instant::now();
        self.expire(&mut attempts, now);

        if let Some(session) = attempts.get_mut(&attempt_id) {
            session.last_used = now;
            return Arc::clone(&session.manager);
        }

        if attempts.len() >= self.limits.max_attempts {
            if let Some(victim) = attempts
                .iter()
                .min_by_key(|(_, s)| s.last_used)
                .map(|(id, _)| *id)
            {
                attempts.remove(&victim);
                info!("Evicted least recently used passage session for attempt {}", victim);
            }
        }

        info!("Starting passage session for attempt {}", attempt_id);
        let manager = Arc::new(self.shared.new_session());
        attempts.insert(
            attempt_id,
            AttemptSession {
                manager: Arc::clone(&manager),
                last_used: now,
            },
        );
        manager
    }

    /// A manager for requests that only read: the attempt's live session if it
    /// has one, otherwise an empty session that is not kept. Never starts a session.
    pub async fn observe(&self, attempt: Option<Uuid>) -> Arc<PassageManager> {
        let Some(attempt_id) = self.attempt_key(attempt) else {
            return Arc::clone(&self.shared);
        };

        let attempts = self.attempts.read().await;
        match attempts.get(&attempt_id) {
            Some(session) if session.last_used.elapsed() <= self.limits.idle_ttl => {
                Arc::clone(&session.manager)
            }
            _ => Arc::new(self.shared.new_session()),
        }
    }

    /// Clears `code` from the durable tier and from every live session tier.
    pub async fn clear_language(&self, code: &LanguageCode) {
        self.shared.clear_language_cache(code).await;

        let managers: Vec<Arc<PassageManager>> = self
            .attempts
            .read()
            .await
            .values()
            .map(|s| Arc::clone(&s.manager))
            .collect();
        for manager in managers {
            manager.forget_session_entry(code).await;
        }
    }

    /// Forgets an attempt's session tier. Returns false if it was never started.
    pub async fn end_attempt(&self, attempt_id: Uuid) -> bool {
        let ended = self.attempts.write().await.remove(&attempt_id).is_some();
        if ended {
            info!("Ended passage session for attempt {}", attempt_id);
        }
        ended
    }

    pub async fn active_attempts(&self) -> usize {
        self.attempts.read().await.len()
    }

    fn expire(&self, attempts: &mut HashMap<Uuid, AttemptSession>, now: Instant) {
        let ttl = self.limits.idle_ttl;
        let before = attempts.len();
        attempts.retain(|_, s| now.saturating_duration_since(s.last_used) <= ttl);
        let expired = before - attempts.len();
        if expired > 0 {
            debug!("Expired {} idle passage session(s)", expired);
        }
    }
}
