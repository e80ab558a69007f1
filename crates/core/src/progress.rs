use crate::models::{DocumentSummary, IngestionEvent, ProgressUpdate};
use serde::Serialize;
use tracing::warn;

/// UI-visible ingestion progress. `None` in [`IngestionState::progress`] means "absent".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub current: u64,
    pub total: u64,
    pub filename: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Reading,
    Tokenizing,
    Stemming,
    Indexing,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 4] = [
        PipelineStage::Reading,
        PipelineStage::Tokenizing,
        PipelineStage::Stemming,
        PipelineStage::Indexing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Reading => "Reading",
            PipelineStage::Tokenizing => "Tokenizing",
            PipelineStage::Stemming => "Stemming",
            PipelineStage::Indexing => "Indexing",
        }
    }
}

impl ProgressSnapshot {
    fn from_update(update: &ProgressUpdate) -> Self {
        let total = update.total.max(0) as u64;
        let current = update.current.clamp(0, total as i64) as u64;
        Self {
            current,
            total,
            filename: update.filename.clone(),
            message: update.message.clone(),
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64 * 100.0
    }

    pub fn stage(&self) -> PipelineStage {
        if self.total == 0 {
            return PipelineStage::Reading;
        }
        let position = (u128::from(self.current) * 4 / u128::from(self.total)).min(3) as usize;
        PipelineStage::ALL[position]
    }
}

/// True when the server reported less progress than it did before.
pub fn is_regression(previous: Option<&ProgressSnapshot>, next: &ProgressSnapshot) -> bool {
    previous.is_some_and(|previous| next.current < previous.current)
}

/// Applies one event to the progress snapshot alone.
pub fn apply_progress(
    state: Option<ProgressSnapshot>,
    event: &IngestionEvent,
) -> Option<ProgressSnapshot> {
    match event {
        IngestionEvent::Progress(update) => {
            let next = ProgressSnapshot::from_update(update);
            if is_regression(state.as_ref(), &next) {
                warn!(
                    previous = state.as_ref().map(|snapshot| snapshot.current),
                    current = next.current,
                    total = next.total,
                    "ingestion progress moved backwards"
                );
            }
            Some(next)
        }
        IngestionEvent::Complete(_) => None,
    }
}

/// Progress plus the active document set, changed only through [`IngestionState::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionState {
    progress: Option<ProgressSnapshot>,
    documents: Vec<DocumentSummary>,
    completed: bool,
    events_applied: usize,
    regressions: usize,
}

impl IngestionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> Option<&ProgressSnapshot> {
        self.progress.as_ref()
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn events_applied(&self) -> usize {
        self.events_applied
    }

    /// Number of progress updates whose `current` went below the previous one.
    pub fn regressions(&self) -> usize {
        self.regressions
    }

    pub fn apply(&mut self, event: IngestionEvent) {
        let previous = self.progress.take();
        let regressed = match &event {
            IngestionEvent::Progress(update) => {
                is_regression(previous.as_ref(), &ProgressSnapshot::from_update(update))
            }
            IngestionEvent::Complete(_) => false,
        };

        self.progress = apply_progress(previous, &event);
        if regressed {
            self.regressions += 1;
        }
        if let IngestionEvent::Complete(documents) = event {
            self.documents = documents;
            self.completed = true;
        }
        self.events_applied += 1;
    }

    pub fn into_documents(self) -> Vec<DocumentSummary> {
        self.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(current: i64, total: i64) -> IngestionEvent {
        IngestionEvent::Progress(ProgressUpdate {
            current,
            total,
            filename: "a.txt".to_string(),
            message: "reading".to_string(),
        })
    }

    fn summary(id: &str) -> DocumentSummary {
        DocumentSummary {
            id: id.to_string(),
            filename: format!("{id}.txt"),
            original_text_preview: String::new(),
            processed_text_preview: String::new(),
            word_count: 4,
        }
    }

    #[test]
    fn progress_replaces_snapshot() {
        let snapshot = apply_progress(None, &progress(1, 2)).unwrap();
        assert_eq!(
            snapshot,
            ProgressSnapshot {
                current: 1,
                total: 2,
                filename: "a.txt".to_string(),
                message: "reading".to_string(),
            }
        );

        let snapshot = apply_progress(Some(snapshot), &progress(2, 2)).unwrap();
        assert_eq!(snapshot.current, 2);
    }

    #[test]
    fn current_is_clamped_into_total() {
        assert_eq!(apply_progress(None, &progress(9, 4)).unwrap().current, 4);
        assert_eq!(apply_progress(None, &progress(-3, 4)).unwrap().current, 0);

        let negative_total = apply_progress(None, &progress(2, -1)).unwrap();
        assert_eq!((negative_total.current, negative_total.total), (0, 0));
    }

    #[test]
    fn complete_clears_progress_and_replaces_documents_together() {
        let mut state = IngestionState::new();
        state.apply(IngestionEvent::Complete(vec![summary("old")]));
        state.apply(progress(1, 2));
        assert!(state.progress().is_some());
        assert_eq!(state.documents().len(), 1);

        state.apply(IngestionEvent::Complete(vec![summary("x"), summary("y")]));

        assert!(state.progress().is_none());
        assert!(state.is_complete());
        let ids: Vec<_> = state.documents().iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, ["x", "y"]);
    }

    #[test]
    fn backwards_progress_is_accepted_and_counted() {
        let mut state = IngestionState::new();
        state.apply(progress(3, 5));
        state.apply(progress(2, 5));

        assert_eq!(state.progress().map(|snapshot| snapshot.current), Some(2));
        assert_eq!(state.regressions(), 1);
        assert_eq!(state.events_applied(), 2);
    }

    #[test]
    fn fixed_event_sequence_ends_with_empty_document_set() {
        let mut state = IngestionState::new();
        for event in [progress(1, 2), IngestionEvent::Complete(Vec::new())] {
            state.apply(event);
        }

        assert!(state.progress().is_none());
        assert!(state.documents().is_empty());
        assert!(state.is_complete());
    }

    #[test]
    fn percentage_and_stage_follow_progress() {
        let empty = apply_progress(None, &progress(0, 0)).unwrap();
        assert_eq!(empty.percentage(), 0.0);
        assert_eq!(empty.stage(), PipelineStage::Reading);

        let half = apply_progress(None, &progress(5, 10)).unwrap();
        assert_eq!(half.percentage(), 50.0);
        assert_eq!(half.stage(), PipelineStage::Stemming);

        let done = apply_progress(None, &progress(10, 10)).unwrap();
        assert_eq!(done.stage(), PipelineStage::Indexing);
        assert_eq!(done.stage().label(), "Indexing");
    }

    #[test]
    fn stage_handles_counters_near_the_integer_limit() {
        let huge = apply_progress(None, &progress(i64::MAX, i64::MAX)).unwrap();
        assert_eq!(huge.stage(), PipelineStage::Indexing);
        assert_eq!(huge.percentage(), 100.0);

        let early = apply_progress(None, &progress(1, i64::MAX)).unwrap();
        assert_eq!(early.stage(), PipelineStage::Reading);
    }
}
