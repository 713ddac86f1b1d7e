//! The idempotency gate wrapping payment-provider event side effects.

use chrono::Duration;

use crate::domain::repository::WebhookEventRepository;
use crate::domain::types::ClaimOutcome;
use crate::error::AutomationServiceError;

/// Outcome reported to the webhook caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The side effect ran to completion during this call.
    Processed,
    /// A prior or in-flight attempt owns this event id; nothing ran.
    Duplicate,
}

/// Runs an arbitrary side effect at most once per (provider, event_id).
///
/// The claim is a store-level insert-or-conflict, so concurrent deliveries
/// race on the unique index rather than on an application check. A failed
/// side effect marks the row `failed` and re-raises — the HTTP layer maps
/// that to a 5xx, the provider redelivers, and the failed row is reclaimed
/// for another attempt.
pub struct ProcessWebhookUseCase<W: WebhookEventRepository> {
    pub events: W,
    /// `processing` rows older than this are treated as crashed attempts
    /// and become reclaimable.
    pub stale_after: Duration,
}

impl<W: WebhookEventRepository> ProcessWebhookUseCase<W> {
    pub async fn execute<F, Fut>(
        &self,
        provider: &str,
        event_id: &str,
        event_type: &str,
        side_effect: F,
    ) -> Result<WebhookOutcome, AutomationServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), AutomationServiceError>>,
    {
        let claim = self
            .events
            .claim(provider, event_id, event_type, self.stale_after)
            .await?;
        match claim {
            ClaimOutcome::Duplicate => Ok(WebhookOutcome::Duplicate),
            ClaimOutcome::Claimed => match side_effect().await {
                Ok(()) => {
                    self.events.mark_processed(provider, event_id).await?;
                    Ok(WebhookOutcome::Processed)
                }
                Err(e) => {
                    self.events.mark_failed(provider, event_id).await?;
                    Err(e)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use lexflow_domain::status::WebhookStatus;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockRow {
        provider: String,
        event_id: String,
        status: WebhookStatus,
        created_at: DateTime<Utc>,
    }

    /// Claim table in memory with the store's reclaim semantics: a fresh key
    /// wins, a `failed` row is reclaimable, and a `processing` row is
    /// reclaimable only once older than the staleness cutoff.
    #[derive(Default)]
    struct MockWebhookRepo {
        rows: Mutex<Vec<MockRow>>,
    }

    impl MockWebhookRepo {
        fn seeded(event_id: &str, status: WebhookStatus, age: Duration) -> Self {
            let repo = Self::default();
            repo.rows.lock().unwrap().push(MockRow {
                provider: "stripe".into(),
                event_id: event_id.into(),
                status,
                created_at: Utc::now() - age,
            });
            repo
        }

        fn status_of(&self, event_id: &str) -> Option<WebhookStatus> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.event_id == event_id)
                .map(|r| r.status)
        }

        fn set_status(&self, provider: &str, event_id: &str, status: WebhookStatus) {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows
                .iter_mut()
                .find(|r| r.provider == provider && r.event_id == event_id)
            {
                row.status = status;
            }
        }
    }

    impl WebhookEventRepository for MockWebhookRepo {
        async fn claim(
            &self,
            provider: &str,
            event_id: &str,
            _event_type: &str,
            stale_after: Duration,
        ) -> Result<ClaimOutcome, AutomationServiceError> {
            let now = Utc::now();
            let mut rows = self.rows.lock().unwrap();
            let Some(row) = rows
                .iter_mut()
                .find(|r| r.provider == provider && r.event_id == event_id)
            else {
                rows.push(MockRow {
                    provider: provider.to_owned(),
                    event_id: event_id.to_owned(),
                    status: WebhookStatus::Processing,
                    created_at: now,
                });
                return Ok(ClaimOutcome::Claimed);
            };
            let reclaimable = row.status == WebhookStatus::Failed
                || (row.status == WebhookStatus::Processing
                    && row.created_at < now - stale_after);
            if reclaimable {
                row.status = WebhookStatus::Processing;
                row.created_at = now;
                Ok(ClaimOutcome::Claimed)
            } else {
                Ok(ClaimOutcome::Duplicate)
            }
        }

        async fn mark_processed(
            &self,
            provider: &str,
            event_id: &str,
        ) -> Result<(), AutomationServiceError> {
            self.set_status(provider, event_id, WebhookStatus::Processed);
            Ok(())
        }

        async fn mark_failed(
            &self,
            provider: &str,
            event_id: &str,
        ) -> Result<(), AutomationServiceError> {
            self.set_status(provider, event_id, WebhookStatus::Failed);
            Ok(())
        }
    }

    fn gate(repo: MockWebhookRepo) -> ProcessWebhookUseCase<MockWebhookRepo> {
        ProcessWebhookUseCase {
            events: repo,
            stale_after: Duration::minutes(15),
        }
    }

    #[tokio::test]
    async fn should_run_side_effect_exactly_once_across_deliveries() {
        let uc = gate(MockWebhookRepo::default());
        let runs = AtomicU32::new(0);

        for _ in 0..5 {
            let _ = uc
                .execute("stripe", "evt_123", "checkout.session.completed", || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_report_duplicate_without_running_side_effect() {
        let uc = gate(MockWebhookRepo::default());

        let first = uc
            .execute("stripe", "evt_123", "checkout.session.completed", || async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(first, WebhookOutcome::Processed);

        let second = uc
            .execute("stripe", "evt_123", "checkout.session.completed", || async {
                panic!("side effect must not run for a duplicate")
            })
            .await
            .unwrap();
        assert_eq!(second, WebhookOutcome::Duplicate);
    }

    #[tokio::test]
    async fn should_mark_failed_and_propagate_side_effect_error() {
        let uc = gate(MockWebhookRepo::default());

        let result = uc
            .execute("stripe", "evt_err", "checkout.session.completed", || async {
                Err(AutomationServiceError::Internal(anyhow::anyhow!("boom")))
            })
            .await;

        assert!(matches!(result, Err(AutomationServiceError::Internal(_))));
        assert_eq!(uc.events.status_of("evt_err"), Some(WebhookStatus::Failed));
    }

    #[tokio::test]
    async fn should_allow_retry_after_failed_attempt() {
        let uc = gate(MockWebhookRepo::default());

        let _ = uc
            .execute("stripe", "evt_retry", "checkout.session.completed", || async {
                Err(AutomationServiceError::Internal(anyhow::anyhow!("first attempt")))
            })
            .await;

        let runs = AtomicU32::new(0);
        let outcome = uc
            .execute("stripe", "evt_retry", "checkout.session.completed", || async {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(
            uc.events.status_of("evt_retry"),
            Some(WebhookStatus::Processed)
        );
    }

    #[tokio::test]
    async fn should_not_reclaim_in_flight_processing_row() {
        // Another worker claimed this event one minute ago and is still on it.
        let repo =
            MockWebhookRepo::seeded("evt_busy", WebhookStatus::Processing, Duration::minutes(1));
        let uc = gate(repo);
        let runs = AtomicU32::new(0);

        let outcome = uc
            .execute("stripe", "evt_busy", "checkout.session.completed", || async {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Duplicate);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(
            uc.events.status_of("evt_busy"),
            Some(WebhookStatus::Processing)
        );
    }

    #[tokio::test]
    async fn should_reclaim_processing_row_older_than_stale_cutoff() {
        // A crashed attempt: claimed twenty minutes ago, never completed.
        let repo =
            MockWebhookRepo::seeded("evt_stale", WebhookStatus::Processing, Duration::minutes(20));
        let uc = gate(repo);
        let runs = AtomicU32::new(0);

        let outcome = uc
            .execute("stripe", "evt_stale", "checkout.session.completed", || async {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(
            uc.events.status_of("evt_stale"),
            Some(WebhookStatus::Processed)
        );
    }

    #[tokio::test]
    async fn should_treat_distinct_event_ids_independently() {
        let uc = gate(MockWebhookRepo::default());
        let runs = AtomicU32::new(0);

        for id in ["evt_1", "evt_2", "evt_3"] {
            let outcome = uc
                .execute("stripe", id, "checkout.session.completed", || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap();
            assert_eq!(outcome, WebhookOutcome::Processed);
        }

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }
}
