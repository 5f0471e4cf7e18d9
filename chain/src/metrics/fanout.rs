//! Concurrent fan-out of independent upstream queries.
//!
//! A [`FanOut`] is a small task group scoped to one scrape: queries are
//! spawned onto the runtime, each bounded by the scrape deadline and
//! recorded under the scrape's span, and [`FanOut::join_all`] waits for
//! every one of them. Each task reports its own outcome, so one failed
//! query never hides the result of another.

use std::future::Future;

use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{Instrument, Span};

use crate::context::{ScrapeContext, bounded_by};
use crate::node_client::QueryError;

/// Failure of a single fan-out task.
#[derive(Debug, Error)]
pub enum FanOutError {
    #[error(transparent)]
    Query(#[from] QueryError),
    /// The task panicked or was cancelled before producing a result.
    #[error("query task did not complete: {0}")]
    Join(#[from] JoinError),
}

/// Result of one named task in a [`FanOut`].
#[derive(Debug)]
pub struct TaskOutcome<T> {
    pub name: &'static str,
    pub result: Result<T, FanOutError>,
}

pub struct FanOut<T> {
    deadline: Instant,
    span: Span,
    tasks: Vec<(&'static str, JoinHandle<Result<T, QueryError>>)>,
}

impl<T: Send + 'static> FanOut<T> {
    pub fn new(ctx: &ScrapeContext) -> Self {
        Self {
            deadline: ctx.deadline(),
            span: ctx.span().clone(),
            tasks: Vec::new(),
        }
    }

    /// Starts `query` immediately; it runs concurrently with every other
    /// task of this group.
    pub fn spawn<F>(&mut self, name: &'static str, query: F)
    where
        F: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        let deadline = self.deadline;
        let handle = tokio::spawn(bounded_by(deadline, query).instrument(self.span.clone()));
        self.tasks.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every task and returns the outcomes in spawn order.
    pub async fn join_all(self) -> Vec<TaskOutcome<T>> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (name, handle) in self.tasks {
            let result = match handle.await {
                Ok(result) => result.map_err(FanOutError::from),
                Err(err) => Err(FanOutError::from(err)),
            };
            outcomes.push(TaskOutcome { name, result });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn tasks_run_concurrently_and_keep_spawn_order() {
        let ctx = ScrapeContext::new("/test", Duration::from_secs(10));
        let started = Instant::now();

        let mut fan_out: FanOut<u32> = FanOut::new(&ctx);
        fan_out.spawn("slow", async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(1)
        });
        fan_out.spawn("fast", async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(2)
        });
        assert_eq!(fan_out.len(), 2);

        let outcomes = fan_out.join_all().await;
        assert!(started.elapsed() < Duration::from_secs(4));

        let names: Vec<_> = outcomes.iter().map(|o| o.name).collect();
        assert_eq!(names, ["slow", "fast"]);
        assert_eq!(outcomes[0].result.as_ref().unwrap(), &1);
        assert_eq!(outcomes[1].result.as_ref().unwrap(), &2);
    }

    #[tokio::test(start_paused = true)]
    async fn each_task_reports_its_own_failure() {
        let ctx = ScrapeContext::new("/test", Duration::from_secs(2));

        let mut fan_out: FanOut<u32> = FanOut::new(&ctx);
        fan_out.spawn("ok", async { Ok(7) });
        fan_out.spawn("broken", async {
            Err(QueryError::Service("HTTP 500".to_string()))
        });
        fan_out.spawn("hung", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0)
        });

        let outcomes = fan_out.join_all().await;
        assert_eq!(outcomes[0].result.as_ref().unwrap(), &7);
        assert!(matches!(
            outcomes[1].result,
            Err(FanOutError::Query(QueryError::Service(_)))
        ));
        assert!(matches!(
            outcomes[2].result,
            Err(FanOutError::Query(QueryError::DeadlineExceeded))
        ));
    }

    #[tokio::test]
    async fn panicking_task_is_captured() {
        let ctx = ScrapeContext::new("/test", Duration::from_secs(2));

        let mut fan_out: FanOut<u32> = FanOut::new(&ctx);
        fan_out.spawn("panics", async {
            let decoded: Option<u32> = None;
            Ok(decoded.expect("decoder bug"))
        });

        let outcomes = fan_out.join_all().await;
        assert!(matches!(outcomes[0].result, Err(FanOutError::Join(_))));
    }
}
