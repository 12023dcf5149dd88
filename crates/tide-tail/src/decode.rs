//! Newline-delimited JSON decoding of chunked stream responses.
//!
//! The streaming endpoint delivers frames that usually hold whole
//! JSON lines, but a frame boundary can fall mid-line. Undecodable lines
//! are dropped silently — an expected artifact of framing, not a fault.
//! Reassembly is the transport's job; the decoder resumes on the next
//! complete line.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value;
use tracing::trace;

use tide_client::{ByteChunks, LogRecord, SearchBackend, SearchQuery};

use crate::error::StreamError;

/// Decodes one network frame into records.
///
/// The frame is taken as UTF-8 text and split on newlines. An object with
/// a `"hits"` array flattens into its elements; a bare object is one
/// record; anything else is dropped.
#[must_use]
pub fn decode_chunk(chunk: &[u8]) -> Vec<LogRecord> {
    let text = String::from_utf8_lossy(chunk);
    let mut records = Vec::new();

    for line in text.trim().split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Ok(value) = serde_json::from_str::<Value>(line) else {
            trace!(len = line.len(), "dropping undecodable line");
            continue;
        };

        match value {
            Value::Object(mut fields) => {
                if fields.contains_key("hits") {
                    if let Some(Value::Array(hits)) = fields.remove("hits") {
                        records.extend(hits.into_iter().filter_map(LogRecord::from_value));
                    }
                } else {
                    records.push(LogRecord::new(fields));
                }
            }
            _ => trace!("dropping non-object line"),
        }
    }

    records
}

/// A lazy sequence of records decoded from a chunked response.
///
/// Infinite while the connection stays open; restart by opening a new
/// stream. A transport failure terminates the sequence with
/// [`StreamError::Transport`] — retry policy belongs to the caller.
pub struct RecordDecoder {
    chunks: ByteChunks,
    decoded: VecDeque<LogRecord>,
}

impl RecordDecoder {
    /// Wraps a raw chunk stream.
    #[must_use]
    pub fn new(chunks: ByteChunks) -> Self {
        Self {
            chunks,
            decoded: VecDeque::new(),
        }
    }
}

impl Stream for RecordDecoder {
    type Item = Result<LogRecord, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(record) = this.decoded.pop_front() {
                return Poll::Ready(Some(Ok(record)));
            }

            match this.chunks.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.decoded.extend(decode_chunk(&chunk));
                }
                Poll::Ready(Some(Err(source))) => {
                    return Poll::Ready(Some(Err(StreamError::Transport { source })));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Opens a chunked stream for the query and decodes it lazily.
///
/// # Errors
///
/// Returns [`StreamError::Transport`] when the stream cannot be opened.
pub async fn stream_records<C>(backend: &C, query: &SearchQuery) -> Result<RecordDecoder, StreamError>
where
    C: SearchBackend + ?Sized,
{
    let chunks = backend
        .stream(query)
        .await
        .map_err(|source| StreamError::Transport { source })?;
    Ok(RecordDecoder::new(chunks))
}
