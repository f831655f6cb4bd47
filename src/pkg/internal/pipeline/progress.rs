use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Display-only milestones. Consumers may render them as percentages; the
/// only contract is that the percentage increases monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    UploadComplete,
    RecordCreated,
    TextExtracted,
    AnalysisComplete,
}

impl Checkpoint {
    pub fn percent(&self) -> u8 {
        match self {
            Checkpoint::UploadComplete => 20,
            Checkpoint::RecordCreated => 40,
            Checkpoint::TextExtracted => 70,
            Checkpoint::AnalysisComplete => 100,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub evaluation_id: Uuid,
    pub checkpoint: Checkpoint,
    pub percent: u8,
    pub at: DateTime<Utc>,
}

pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

/// Emits checkpoint events into a subscriber channel. The pipeline never
/// knows who is listening; a gone receiver only means nobody is watching.
#[derive(Clone)]
pub struct Progress {
    evaluation_id: Uuid,
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl Progress {
    pub fn new(evaluation_id: Uuid) -> (Self, ProgressReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { evaluation_id, tx }, rx)
    }

    pub fn emit(&self, checkpoint: Checkpoint) {
        let event = ProgressEvent {
            evaluation_id: self.evaluation_id,
            checkpoint,
            percent: checkpoint.percent(),
            at: Utc::now(),
        };
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_increase_monotonically() {
        let ordered = [
            Checkpoint::UploadComplete,
            Checkpoint::RecordCreated,
            Checkpoint::TextExtracted,
            Checkpoint::AnalysisComplete,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].percent() < pair[1].percent());
        }
        assert_eq!(Checkpoint::AnalysisComplete.percent(), 100);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn subscribers_receive_events_in_emission_order() {
        let id = Uuid::new_v4();
        let (progress, mut events) = Progress::new(id);
        progress.emit(Checkpoint::UploadComplete);
        progress.emit(Checkpoint::RecordCreated);
        progress.emit(Checkpoint::TextExtracted);
        drop(progress);

        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            assert_eq!(event.evaluation_id, id);
            seen.push(event.checkpoint);
        }
        assert_eq!(
            seen,
            vec![
                Checkpoint::UploadComplete,
                Checkpoint::RecordCreated,
                Checkpoint::TextExtracted
            ]
        );
    }

    #[test]
    fn emitting_without_a_listener_is_harmless() {
        let (progress, events) = Progress::new(Uuid::new_v4());
        drop(events);
        progress.emit(Checkpoint::AnalysisComplete);
    }
}
