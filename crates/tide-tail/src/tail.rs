//! The tail coordinator: recent history, then follow.
//!
//! `tail` composes a one-shot "last N lines" query with a handoff into
//! [`LogPoller`] for follow mode, the `tail -f` shape: show what already
//! happened, then keep up with what happens next.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use tide_client::{LogRecord, SearchBackend, SearchQuery};
use tide_query::{OrderDir, QueryFilter, SelectBuilder, TimeExpr, TimeUnit};

use crate::error::StreamError;
use crate::poller::{LogPoller, PollerConfig, StopHandle};

/// Window reach of the initial history query.
const HISTORY_START: TimeExpr = TimeExpr::Relative {
    amount: 1,
    unit: TimeUnit::Hours,
};

/// Follow floor when the history batch comes back empty.
const EMPTY_BATCH_START: TimeExpr = TimeExpr::Relative {
    amount: 1,
    unit: TimeUnit::Seconds,
};

/// Default number of history lines.
pub const DEFAULT_LINES: u64 = 100;

/// Capacity of the channel behind [`LogTail::into_stream`].
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Parameters of one tail call.
#[derive(Debug, Clone)]
pub struct TailRequest {
    /// Stream to tail.
    pub stream: String,
    /// Exact-match column filters.
    pub filters: QueryFilter,
    /// Keep following after the initial batch.
    pub follow: bool,
    /// Number of history lines to fetch first, `1..=10000`.
    pub lines: u64,
}

impl TailRequest {
    /// Creates a request for the given stream with default settings.
    #[must_use]
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            filters: QueryFilter::new(),
            follow: false,
            lines: DEFAULT_LINES,
        }
    }

    /// Sets the exact-match filters.
    #[must_use]
    pub fn with_filters(mut self, filters: QueryFilter) -> Self {
        self.filters = filters;
        self
    }

    /// Enables or disables follow mode.
    #[must_use]
    pub const fn follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    /// Sets the history depth.
    #[must_use]
    pub const fn lines(mut self, lines: u64) -> Self {
        self.lines = lines;
        self
    }
}

/// A lazy sequence of history and, in follow mode, new records.
///
/// History comes out in ascending timestamp order; follow-phase records
/// in backend batch order, each at most once per fingerprint.
pub struct LogTail<C> {
    history: VecDeque<LogRecord>,
    follow: Option<LogPoller<C>>,
}

impl<C: SearchBackend> LogTail<C> {
    /// Pulls the next record; `Ok(None)` ends the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Search`] when a follow-phase poll fails.
    pub async fn next_record(&mut self) -> Result<Option<LogRecord>, StreamError> {
        if let Some(record) = self.history.pop_front() {
            return Ok(Some(record));
        }
        match self.follow.as_mut() {
            Some(poller) => poller.next_record().await,
            None => Ok(None),
        }
    }

    /// A handle that stops the follow phase; `None` without follow mode.
    #[must_use]
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.follow.as_ref().map(LogPoller::stop_handle)
    }

    /// Number of history records not yet consumed.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Moves the tail onto a background task, yielding records through a
    /// bounded channel.
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

/// Tails a stream with default poller settings.
///
/// # Errors
///
/// Returns a validation error for a bad stream name, filter column, or
/// line count — always before any network call — or a search error from
/// the history query.
pub async fn tail<C: SearchBackend>(
    backend: Arc<C>,
    request: &TailRequest,
) -> Result<LogTail<C>, StreamError> {
    tail_with_config(backend, request, PollerConfig::default()).await
}

/// Tails a stream with explicit poller settings for the follow phase.
///
/// # Errors
///
/// See [`tail`].
pub async fn tail_with_config<C: SearchBackend>(
    backend: Arc<C>,
    request: &TailRequest,
    config: PollerConfig,
) -> Result<LogTail<C>, StreamError> {
    // Fail fast: every caller-supplied part is validated here, before the
    // first network call.
    let history_sql = SelectBuilder::new(&request.stream)
        .filters(request.filters.clone())
        .order(OrderDir::Descending)
        .limit(request.lines)
        .build()?;

    debug!(
        stream = %request.stream,
        lines = request.lines,
        follow = request.follow,
        "starting tail"
    );

    let query = SearchQuery::new(history_sql, HISTORY_START, TimeExpr::Now, request.lines);
    let mut hits = backend
        .search(&query)
        .await
        .map_err(|source| StreamError::Search { source })?
        .hits;

    // The backend returns newest-first; consumers see chronological order.
    hits.reverse();

    let follow = if request.follow {
        let newest = hits.iter().map(LogRecord::timestamp_us).max();
        let start = newest.map_or(EMPTY_BATCH_START, TimeExpr::Absolute);

        let follow_sql = SelectBuilder::new(&request.stream)
            .filters(request.filters.clone())
            .order(OrderDir::Ascending)
            .build()?;

        let mut poller = LogPoller::new(backend, follow_sql, Some(&start), config);
        // The follow window is inclusive of the newest history timestamp;
        // seeding the seen set keeps the boundary records from coming out
        // twice.
        poller.mark_seen(&hits);
        Some(poller)
    } else {
        None
    };

    Ok(LogTail {
        history: hits.into(),
        follow,
    })
}
