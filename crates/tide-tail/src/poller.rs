//! The deduplicating poll loop.
//!
//! A [`LogPoller`] repeatedly searches an advancing time window, filters
//! out records it has already yielded, and sleeps between cycles. Each
//! poller owns its [`SeenSet`] and window floor outright; concurrent tails
//! run one poller per task.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace};

use tide_client::{LogRecord, SearchBackend, SearchQuery};
use tide_query::{now_us, resolve_or, TimeExpr, TimeUnit};

use crate::error::StreamError;
use crate::fingerprint::{Fingerprint, SeenSet};

/// Page size for each bounded poll search.
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// Default pause between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default dedup horizon; see [`PollerConfig::prune_horizon`].
pub const DEFAULT_PRUNE_HORIZON: Duration = Duration::from_secs(60);

/// Window floor when the caller gives no start expression.
const DEFAULT_START: TimeExpr = TimeExpr::Relative {
    amount: 1,
    unit: TimeUnit::Minutes,
};

/// Capacity of the channel behind [`LogPoller::into_stream`].
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Tuning knobs for [`LogPoller`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Maximum hits fetched per cycle.
    pub page_size: u64,
    /// Pause between cycles.
    pub poll_interval: Duration,
    /// How long fingerprints are retained. A backend that re-delivers
    /// records older than this can produce duplicate output; widen the
    /// horizon to match the backend's redelivery window.
    pub prune_horizon: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            prune_horizon: DEFAULT_PRUNE_HORIZON,
        }
    }
}

impl PollerConfig {
    /// Overrides the per-cycle page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Overrides the pause between cycles.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Overrides the dedup horizon.
    #[must_use]
    pub const fn with_prune_horizon(mut self, prune_horizon: Duration) -> Self {
        self.prune_horizon = prune_horizon;
        self
    }
}

/// Requests a clean stop of one poller.
///
/// The poller observes the signal at its sleep boundary and ends the
/// sequence without an error. Dropping all handles does not stop the
/// poller.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Signals the poller to stop.
    pub fn stop(&self) {
        let _ = self.tx.send(true);
    }
}

/// Lifecycle of one poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollerState {
    Running,
    Stopped,
    Failed,
}

/// Polls an advancing window and yields each record at most once.
///
/// The window floor only ever moves forward, and a record is identified
/// by its content fingerprint, so within the prune horizon no record is
/// yielded twice. Records come out in the order the backend returned
/// them within each batch.
pub struct LogPoller<C> {
    backend: Arc<C>,
    sql: String,
    floor_us: i64,
    config: PollerConfig,
    seen: SeenSet,
    buffer: VecDeque<LogRecord>,
    state: PollerState,
    polled_once: bool,
    stop_rx: watch::Receiver<bool>,
    stop_tx: watch::Sender<bool>,
}

impl<C: SearchBackend> LogPoller<C> {
    /// Creates a poller over `sql`, starting at `start` (default: one
    /// minute ago). The window ceiling is always "now" per request.
    #[must_use]
    pub fn new(
        backend: Arc<C>,
        sql: impl Into<String>,
        start: Option<&TimeExpr>,
        config: PollerConfig,
    ) -> Self {
        let floor_us = resolve_or(start, &DEFAULT_START);
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            backend,
            sql: sql.into(),
            floor_us,
            config,
            seen: SeenSet::new(),
            buffer: VecDeque::new(),
            state: PollerState::Running,
            polled_once: false,
            stop_rx,
            stop_tx,
        }
    }

    /// A handle that stops this poller at its next sleep boundary.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    /// The current window floor in microseconds.
    #[must_use]
    pub const fn floor_us(&self) -> i64 {
        self.floor_us
    }

    /// Marks records as already delivered.
    ///
    /// A window overlapping their timestamps will fetch them again but
    /// not re-yield them. The tail coordinator seeds the follow phase
    /// with its history batch this way.
    pub fn mark_seen<'a>(&mut self, records: impl IntoIterator<Item = &'a LogRecord>) {
        for record in records {
            self.seen.observe(Fingerprint::of(record));
        }
    }

    /// Pulls the next record.
    ///
    /// Returns `Ok(None)` once the poller has been stopped. A search
    /// failure is returned once; the poller is then terminal and further
    /// calls return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Search`] when a poll-cycle search fails.
    pub async fn next_record(&mut self) -> Result<Option<LogRecord>, StreamError> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }

            if self.state != PollerState::Running {
                return Ok(None);
            }
            if *self.stop_rx.borrow() {
                self.state = PollerState::Stopped;
                return Ok(None);
            }

            if self.polled_once {
                // The only suspension point besides the search itself.
                tokio::select! {
                    _ = self.stop_rx.wait_for(|stopped| *stopped) => {
                        self.state = PollerState::Stopped;
                        return Ok(None);
                    }
                    () = sleep(self.config.poll_interval) => {}
                }
            }
            self.polled_once = true;

            if let Err(err) = self.poll_cycle().await {
                self.state = PollerState::Failed;
                return Err(err);
            }
        }
    }

    /// One cycle: search `[floor, now]`, buffer unseen records, advance
    /// the floor, prune the seen set.
    async fn poll_cycle(&mut self) -> Result<(), StreamError> {
        let query = SearchQuery::new(
            self.sql.clone(),
            TimeExpr::Absolute(self.floor_us),
            TimeExpr::Now,
            self.config.page_size,
        );
        debug!(floor_us = self.floor_us, "polling window");

        let results = self
            .backend
            .search(&query)
            .await
            .map_err(|source| StreamError::Search { source })?;

        let hits = results.hits.len();
        let mut fresh = 0_usize;
        for record in results.hits {
            let fingerprint = Fingerprint::of(&record);
            let timestamp = fingerprint.timestamp_us();

            if self.seen.observe(fingerprint) {
                self.buffer.push_back(record);
                fresh += 1;
            }
            // Search windows are inclusive on both ends.
            if timestamp > self.floor_us {
                self.floor_us = timestamp + 1;
            }
        }

        let horizon_us = now_us().saturating_sub(duration_us(self.config.prune_horizon));
        self.seen.prune_older_than(horizon_us);

        trace!(
            hits,
            fresh,
            floor_us = self.floor_us,
            seen = self.seen.len(),
            "poll cycle complete"
        );
        Ok(())
    }

    /// Moves the poller onto a background task, yielding records through
    /// a bounded channel.
    #[must_use]
    pub fn into_stream(mut self) -> ReceiverStream<Result<LogRecord, StreamError>>
    where
        C: 'static,
    {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            loop {
                match self.next_record().await {
                    Ok(Some(record)) => {
                        if tx.send(Ok(record)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        let _ = tx.send(Err(err)).await;
                        break;
                    }
                }
            }
        });
        ReceiverStream::new(rx)
    }
}

fn duration_us(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}
