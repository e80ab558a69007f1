use crate::decoder::StreamDecoder;
use crate::models::{DocumentSummary, IngestionEvent};
use crate::progress::IngestionState;
use crate::traits::ChunkSource;
use crate::{ClientError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub documents: Vec<DocumentSummary>,
    pub events_applied: usize,
    pub skipped_lines: usize,
    pub progress_regressions: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// One ingestion stream: its own decoder buffer and its own progress state.
pub struct IngestionSession {
    id: Uuid,
    decoder: StreamDecoder,
    state: IngestionState,
    started_at: DateTime<Utc>,
}

impl Default for IngestionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestionSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            decoder: StreamDecoder::new(),
            state: IngestionState::new(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &IngestionState {
        &self.state
    }

    /// Decodes one chunk and applies its events. Returns `true` once the stream has completed.
    pub fn ingest_chunk(&mut self, chunk: &[u8]) -> bool {
        let events = self.decoder.feed_bytes(chunk);
        self.apply_all(events)
    }

    /// Flushes the decoder and closes the session.
    pub fn finish(mut self) -> Result<SessionReport> {
        self.flush();
        self.into_report()
    }

    /// Reads `source` until completion, channel end, or cancellation.
    ///
    /// `on_update` sees the state after every chunk that changed it. A cancelled
    /// session applies nothing further and reports [`ClientError::Cancelled`].
    pub async fn run<S, F>(
        mut self,
        source: &mut S,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<SessionReport>
    where
        S: ChunkSource + ?Sized,
        F: FnMut(&IngestionState),
    {
        info!(session_id = %self.id, "ingestion session started");

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(
                        session_id = %self.id,
                        events = self.state.events_applied(),
                        "ingestion session cancelled"
                    );
                    return Err(ClientError::Cancelled);
                }
                chunk = source.next_chunk() => chunk?,
            };

            let Some(chunk) = chunk else {
                break;
            };

            let before = self.state.events_applied();
            let completed = self.ingest_chunk(&chunk);
            if self.state.events_applied() != before {
                on_update(&self.state);
            }
            if completed {
                return self.into_report();
            }
        }

        let before = self.state.events_applied();
        self.flush();
        if self.state.events_applied() != before {
            on_update(&self.state);
        }
        self.into_report()
    }

    fn flush(&mut self) -> bool {
        let residue = self.decoder.close();
        self.apply_all(residue)
    }

    fn apply_all(&mut self, events: Vec<IngestionEvent>) -> bool {
        for event in events {
            if self.state.is_complete() {
                warn!(session_id = %self.id, ?event, "ignoring event after completion");
                continue;
            }
            self.state.apply(event);
        }
        self.state.is_complete()
    }

    fn into_report(self) -> Result<SessionReport> {
        if !self.state.is_complete() {
            warn!(
                session_id = %self.id,
                events = self.state.events_applied(),
                "ingestion stream ended without completion"
            );
            return Err(ClientError::IncompleteSession {
                events: self.state.events_applied(),
            });
        }

        let report = SessionReport {
            session_id: self.id,
            events_applied: self.state.events_applied(),
            skipped_lines: self.decoder.skipped_lines(),
            progress_regressions: self.state.regressions(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            documents: self.state.into_documents(),
        };
        info!(
            session_id = %report.session_id,
            documents = report.documents.len(),
            skipped_lines = report.skipped_lines,
            "ingestion session complete"
        );
        Ok(report)
    }
}
