//! In-memory fakes shared by the collector tests.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tracing_subscriber::fmt::MakeWriter;

use crate::chain_status::{ChainStatus, ChainStatusProvider};
use crate::node_client::{NodeQuery, QueryError};
use crate::types::{BlockHeader, Proposal, ProposalStatus, UpgradePlan};

pub(crate) fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
}

pub(crate) fn proposal(id: u64, title: &str) -> Proposal {
    Proposal {
        id,
        title: title.to_string(),
        status: ProposalStatus::VotingPeriod,
        voting_start_time: Some(at(12, 0, 0)),
        voting_end_time: Some(at(18, 0, 0)),
    }
}

pub(crate) fn plan(name: &str, height: i64) -> UpgradePlan {
    UpgradePlan {
        name: name.to_string(),
        info: format!("{name}-binaries"),
        time: Some(Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap()),
        height,
    }
}

/// Lines of a rendered exposition that belong to `family`.
pub(crate) fn samples<'a>(text: &'a str, family: &str) -> Vec<&'a str> {
    let prefix = format!("{family}{{");
    text.lines().filter(|l| l.starts_with(&prefix)).collect()
}

/// Fake node with canned answers; errors are given as messages and turned
/// into transport errors.
pub(crate) struct FakeNode {
    pub proposals: Result<Vec<Proposal>, &'static str>,
    pub plan: Result<Option<UpgradePlan>, &'static str>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl Default for FakeNode {
    fn default() -> Self {
        Self {
            proposals: Ok(Vec::new()),
            plan: Ok(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeNode {
    async fn answer<T: Clone>(&self, canned: &Result<T, &'static str>) -> Result<T, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        canned
            .clone()
            .map_err(|msg| QueryError::Transport(msg.to_string()))
    }
}

#[async_trait]
impl NodeQuery for FakeNode {
    async fn proposals(&self, limit: u64) -> Result<Vec<Proposal>, QueryError> {
        let mut page = self.answer(&self.proposals).await?;
        page.truncate(limit as usize);
        Ok(page)
    }

    async fn current_plan(&self) -> Result<Option<UpgradePlan>, QueryError> {
        self.answer(&self.plan).await
    }

    async fn latest_block(&self) -> Result<BlockHeader, QueryError> {
        Err(QueryError::Service("not served by fake".to_string()))
    }

    async fn block_at(&self, _height: i64) -> Result<BlockHeader, QueryError> {
        Err(QueryError::Service("not served by fake".to_string()))
    }
}

pub(crate) struct FakeChainStatus {
    pub status: Result<ChainStatus, &'static str>,
    pub calls: AtomicUsize,
}

impl FakeChainStatus {
    /// Chain at `height`, producing a block every 6s.
    pub fn at_height(height: i64) -> Self {
        Self {
            status: Ok(ChainStatus::new(height, at(12, 0, 0)).with_block_time(Duration::from_secs(6))),
            calls: AtomicUsize::new(0),
        }
    }

    /// Chain at `height` with no usable block history.
    pub fn without_history(height: i64) -> Self {
        Self {
            status: Ok(ChainStatus::new(height, at(12, 0, 0))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(msg: &'static str) -> Self {
        Self {
            status: Err(msg),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainStatusProvider for FakeChainStatus {
    async fn status(&self) -> Result<ChainStatus, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.status
            .clone()
            .map_err(|msg| QueryError::Transport(msg.to_string()))
    }
}

/// Formatted log output captured from a test subscriber.
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// True when some captured line is an event at `level` carrying `message`.
    pub fn has_event(&self, level: &str, message: &str) -> bool {
        self.contents()
            .lines()
            .any(|line| line.contains(level) && line.contains(message))
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `fut` with a thread-local subscriber writing into the returned
/// buffer. Collector tests run on the current-thread runtime, so every
/// event emitted while `fut` is polled lands in the buffer.
pub(crate) async fn capture_logs<F: Future>(fut: F) -> (F::Output, LogBuffer) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let _guard = tracing::subscriber::set_default(subscriber);
    let output = fut.await;
    (output, logs)
}
