//! Per-scrape request context.
//!
//! A [`ScrapeContext`] is created by the dispatcher for every inbound
//! scrape and passed explicitly down through the collector. It carries the
//! correlation id, the deadline every upstream call is bounded by, and the
//! tracing span all log events of the request are recorded under.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Span;
use uuid::Uuid;

use crate::node_client::QueryError;

#[derive(Clone, Debug)]
pub struct ScrapeContext {
    request_id: Uuid,
    endpoint: &'static str,
    started: Instant,
    deadline: Instant,
    span: Span,
}

impl ScrapeContext {
    /// Starts a new scrape for `endpoint` that must finish within
    /// `timeout`.
    pub fn new(endpoint: &'static str, timeout: Duration) -> Self {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let span = tracing::info_span!("scrape", request_id = %request_id, endpoint);
        Self {
            request_id,
            endpoint,
            started,
            deadline: started + timeout,
            span,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time since the scrape started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Runs an upstream call, abandoning it once the deadline passes.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, QueryError>>,
    {
        bounded_by(self.deadline, call).await
    }
}

pub(crate) async fn bounded_by<T, F>(deadline: Instant, call: F) -> Result<T, QueryError>
where
    F: Future<Output = Result<T, QueryError>>,
{
    tokio::time::timeout_at(deadline, call)
        .await
        .unwrap_or(Err(QueryError::DeadlineExceeded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scrape_gets_its_own_id() {
        let a = ScrapeContext::new("/metrics/proposals", Duration::from_secs(1));
        let b = ScrapeContext::new("/metrics/proposals", Duration::from_secs(1));
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(a.endpoint(), "/metrics/proposals");
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_call_within_deadline_passes_through() {
        let ctx = ScrapeContext::new("/metrics/upgrade", Duration::from_secs(5));
        let value = ctx
            .bounded(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, QueryError>(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_call_past_deadline_is_abandoned() {
        let ctx = ScrapeContext::new("/metrics/upgrade", Duration::from_secs(1));
        let err = ctx
            .bounded(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, QueryError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }
}
