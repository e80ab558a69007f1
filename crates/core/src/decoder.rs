use crate::error::DecodeError;
use crate::models::{DocumentSummary, IngestionEvent, ProgressUpdate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

/// Lines carrying an event start with this marker; everything else on the wire is ignored.
pub const EVENT_PREFIX: &str = "data:";

/// Largest unterminated line the decoder will hold before dropping it.
pub const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum WireEvent {
    Processing {
        #[serde(deserialize_with = "counter")]
        current: i64,
        #[serde(deserialize_with = "counter")]
        total: i64,
        #[serde(default)]
        filename: String,
        #[serde(default)]
        message: String,
    },
    Complete {
        #[serde(default)]
        documents: Vec<DocumentSummary>,
    },
}

impl From<WireEvent> for IngestionEvent {
    fn from(value: WireEvent) -> Self {
        match value {
            WireEvent::Processing {
                current,
                total,
                filename,
                message,
            } => IngestionEvent::Progress(ProgressUpdate {
                current,
                total,
                filename,
                message,
            }),
            WireEvent::Complete { documents } => IngestionEvent::Complete(documents),
        }
    }
}

/// Progress counters may arrive as JSON integers or as floats such as `3.0`.
/// Finite floats are truncated toward zero; anything else rejects the line.
fn counter<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCounter {
        Integer(i64),
        Float(f64),
    }

    match RawCounter::deserialize(deserializer)? {
        RawCounter::Integer(value) => Ok(value),
        RawCounter::Float(value) if value.is_finite() => Ok(value.trunc() as i64),
        RawCounter::Float(value) => Err(D::Error::custom(format!(
            "progress counter is not finite: {value}"
        ))),
    }
}

/// Parses the payload that follows the event prefix. Unknown `status` values are rejected.
pub fn parse_payload(payload: &str) -> Result<IngestionEvent, DecodeError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let wire: WireEvent = serde_json::from_str(payload)?;
    Ok(wire.into())
}

/// Incremental decoder for one ingestion stream.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere. Bytes after the last
/// newline are carried over to the next call, so the decoded event sequence does
/// not depend on where the transport cut the body. A line that grows past
/// `max_line_bytes` without a newline is dropped and counted as skipped.
#[derive(Debug)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    skipped_lines: usize,
    max_line_bytes: usize,
    discarding: bool,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            skipped_lines: 0,
            max_line_bytes,
            discarding: false,
        }
    }

    pub fn feed(&mut self, chunk: &str) -> Vec<IngestionEvent> {
        self.feed_bytes(chunk.as_bytes())
    }

    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Vec<IngestionEvent> {
        self.buffer.extend_from_slice(chunk);

        if self.discarding {
            match self.buffer.iter().position(|byte| *byte == b'\n') {
                Some(end) => {
                    self.buffer.drain(..=end);
                    self.discarding = false;
                }
                None => {
                    self.buffer.clear();
                    return Vec::new();
                }
            }
        }

        let Some(last_newline) = self.buffer.iter().rposition(|byte| *byte == b'\n') else {
            self.enforce_line_limit();
            return Vec::new();
        };

        let complete: Vec<u8> = self.buffer.drain(..=last_newline).collect();
        let events = complete[..last_newline]
            .split(|byte| *byte == b'\n')
            .filter_map(|line| self.decode_line(line))
            .collect();
        self.enforce_line_limit();
        events
    }

    /// Best-effort parse of whatever partial line is still buffered. The buffer is always emptied.
    pub fn close(&mut self) -> Vec<IngestionEvent> {
        let residue = std::mem::take(&mut self.buffer);
        if std::mem::take(&mut self.discarding) || residue.is_empty() {
            return Vec::new();
        }

        self.decode_line(&residue).into_iter().collect()
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Event lines whose payload could not be parsed.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    fn enforce_line_limit(&mut self) {
        if self.buffer.len() <= self.max_line_bytes {
            return;
        }

        warn!(
            dropped_bytes = self.buffer.len(),
            limit = self.max_line_bytes,
            "dropping oversized unterminated event line"
        );
        self.buffer.clear();
        self.skipped_lines += 1;
        self.discarding = true;
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<IngestionEvent> {
        let text = String::from_utf8_lossy(raw);
        let line = text.strip_suffix('\r').unwrap_or(text.as_ref());
        let payload = line.strip_prefix(EVENT_PREFIX)?;
        let payload = payload.strip_prefix(' ').unwrap_or(payload);

        match parse_payload(payload) {
            Ok(event) => Some(event),
            Err(error) => {
                self.skipped_lines += 1;
                debug!(%error, line = %line, "skipping undecodable event line");
                None
            }
        }
    }
}
