//! TTL snapshot cache for the practice-question catalog.
//!
//! The catalog is static reference data, so the whole collection is cached
//! as one snapshot with a fixed TTL and explicit invalidation. A cache miss
//! fetches from the database with bounded retries and linear-multiple
//! backoff; persistent failure surfaces a terminal error instead of looping.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `QUESTION_CACHE_TTL_SECS`: snapshot TTL in seconds (default: 300)

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use nerofea_core::{defaults, Error, Question, QuestionRepository, Result};

/// Question catalog cache.
#[derive(Clone)]
pub struct QuestionCache {
    inner: Arc<QuestionCacheInner>,
}

struct QuestionCacheInner {
    snapshot: RwLock<Option<Snapshot>>,
    ttl: Duration,
    max_retries: u32,
    backoff: Duration,
}

struct Snapshot {
    questions: Vec<Question>,
    fetched_at: Instant,
}

impl Snapshot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

impl QuestionCache {
    /// Create a cache from environment configuration.
    pub fn from_env() -> Self {
        let ttl_secs: u64 = std::env::var("QUESTION_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::QUESTION_CACHE_TTL_SECS);

        info!("Question cache enabled (TTL: {}s)", ttl_secs);
        Self::with_ttl(Duration::from_secs(ttl_secs))
    }

    /// Create a cache with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(QuestionCacheInner {
                snapshot: RwLock::new(None),
                ttl,
                max_retries: defaults::QUESTION_FETCH_MAX_RETRIES,
                backoff: Duration::from_millis(defaults::QUESTION_FETCH_BACKOFF_MS),
            }),
        }
    }

    /// Shorten the backoff (for tests).
    #[doc(hidden)]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        Arc::get_mut(&mut self.inner)
            .expect("with_backoff must be called before the cache is shared")
            .backoff = backoff;
        self
    }

    /// Get the catalog, serving a fresh snapshot when one exists.
    ///
    /// On a miss, fetches with up to `max_retries` attempts. Attempt `n`
    /// waits `n × backoff` before retrying. After the final failure a
    /// terminal error is returned; the stale snapshot (if any) is not used.
    pub async fn get_or_fetch(&self, repo: &dyn QuestionRepository) -> Result<Vec<Question>> {
        {
            let guard = self.inner.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref() {
                if snapshot.is_fresh(self.inner.ttl) {
                    debug!(count = snapshot.questions.len(), "Question cache HIT");
                    return Ok(snapshot.questions.clone());
                }
            }
        }

        let mut guard = self.inner.snapshot.write().await;
        // Another task may have refilled while we waited for the write lock.
        if let Some(snapshot) = guard.as_ref() {
            if snapshot.is_fresh(self.inner.ttl) {
                return Ok(snapshot.questions.clone());
            }
        }

        let questions = self.fetch_with_retries(repo).await?;
        debug!(count = questions.len(), "Question cache FILL");
        *guard = Some(Snapshot {
            questions: questions.clone(),
            fetched_at: Instant::now(),
        });
        Ok(questions)
    }

    async fn fetch_with_retries(&self, repo: &dyn QuestionRepository) -> Result<Vec<Question>> {
        let max = self.inner.max_retries;
        for attempt in 1..=max {
            debug!(attempt, "Fetching questions from database");
            match repo.list().await {
                Ok(questions) if questions.is_empty() => {
                    warn!(attempt, "No questions found in database");
                }
                Ok(questions) => return Ok(questions),
                Err(e) => {
                    warn!(attempt, error = %e, "Question fetch failed");
                }
            }

            if attempt < max {
                tokio::time::sleep(self.inner.backoff * attempt).await;
            }
        }

        Err(Error::Internal(format!(
            "Failed to load questions after {} attempts. Please refresh the page.",
            max
        )))
    }

    /// Drop the snapshot; the next read refetches.
    pub async fn invalidate(&self) {
        debug!("Question cache INVALIDATE");
        *self.inner.snapshot.write().await = None;
    }

    /// Cache TTL setting.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }
}
