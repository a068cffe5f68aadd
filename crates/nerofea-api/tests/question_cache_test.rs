//! Tests for the question catalog cache: TTL, invalidation, and the bounded
//! retry policy with a terminal error after the final attempt.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use nerofea_api::services::QuestionCache;
use nerofea_core::{new_v7, Difficulty, Error, Question, QuestionRepository, Result};

fn sample_question(number: i32) -> Question {
    Question {
        id: new_v7(),
        number,
        title: format!("Problem {}", number),
        difficulty: Difficulty::Easy,
        topic: "Array".to_string(),
        estimated_minutes: 15,
        url: None,
        week: None,
    }
}

/// Stub repository that fails a configurable number of times before
/// succeeding, counting every call.
struct FlakyRepository {
    calls: Arc<AtomicU32>,
    failures_before_success: u32,
    serve_empty: bool,
}

impl FlakyRepository {
    fn reliable() -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures_before_success: 0,
            serve_empty: false,
        }
    }

    fn failing_times(n: u32) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures_before_success: n,
            serve_empty: false,
        }
    }

    fn always_empty() -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures_before_success: 0,
            serve_empty: true,
        }
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionRepository for FlakyRepository {
    async fn list(&self) -> Result<Vec<Question>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures_before_success {
            return Err(Error::Internal("simulated outage".to_string()));
        }
        if self.serve_empty {
            return Ok(vec![]);
        }
        Ok(vec![sample_question(1), sample_question(2)])
    }
}

fn fast_cache(ttl: Duration) -> QuestionCache {
    QuestionCache::with_ttl(ttl).with_backoff(Duration::from_millis(1))
}

#[tokio::test]
async fn test_fresh_snapshot_served_without_refetch() {
    let cache = fast_cache(Duration::from_secs(300));
    let repo = FlakyRepository::reliable();

    let first = cache.get_or_fetch(&repo).await.unwrap();
    let second = cache.get_or_fetch(&repo).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(repo.call_count(), 1, "second read must hit the snapshot");
}

#[tokio::test]
async fn test_expired_snapshot_refetches() {
    let cache = fast_cache(Duration::from_millis(10));
    let repo = FlakyRepository::reliable();

    cache.get_or_fetch(&repo).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.get_or_fetch(&repo).await.unwrap();

    assert_eq!(repo.call_count(), 2);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let cache = fast_cache(Duration::from_secs(300));
    let repo = FlakyRepository::reliable();

    cache.get_or_fetch(&repo).await.unwrap();
    cache.invalidate().await;
    cache.get_or_fetch(&repo).await.unwrap();

    assert_eq!(repo.call_count(), 2);
}

#[tokio::test]
async fn test_transient_failures_retried() {
    let cache = fast_cache(Duration::from_secs(300));
    let repo = FlakyRepository::failing_times(2);

    let questions = cache.get_or_fetch(&repo).await.unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(repo.call_count(), 3, "two failures then one success");
}

#[tokio::test]
async fn test_persistent_failure_is_terminal_after_three_attempts() {
    let cache = fast_cache(Duration::from_secs(300));
    let repo = FlakyRepository::failing_times(10);

    match cache.get_or_fetch(&repo).await {
        Err(Error::Internal(msg)) => {
            assert!(msg.contains("after 3 attempts"), "got: {}", msg);
        }
        other => panic!("expected terminal error, got {:?}", other.map(|q| q.len())),
    }
    assert_eq!(repo.call_count(), 3, "must stop after the third attempt");
}

#[tokio::test]
async fn test_empty_catalog_treated_as_failure() {
    let cache = fast_cache(Duration::from_secs(300));
    let repo = FlakyRepository::always_empty();

    assert!(cache.get_or_fetch(&repo).await.is_err());
    assert_eq!(repo.call_count(), 3);
}

#[tokio::test]
async fn test_failure_does_not_poison_cache() {
    let cache = fast_cache(Duration::from_secs(300));

    let broken = FlakyRepository::failing_times(10);
    assert!(cache.get_or_fetch(&broken).await.is_err());

    // A later fetch against a healthy repository succeeds and fills the cache.
    let healthy = FlakyRepository::reliable();
    let questions = cache.get_or_fetch(&healthy).await.unwrap();
    assert_eq!(questions.len(), 2);
}
