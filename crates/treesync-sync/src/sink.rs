//! Outcome sinks
//!
//! - [`OutcomeCollector`] keeps every record in memory and can summarize a run
//! - [`ChannelOutcomeSink`] forwards records over a tokio channel so a
//!   consumer can show progress while the run is still going

use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;
use treesync_core::domain::outcome::{CopyOutcome, DeleteOutcome, OutcomeStatus};
use treesync_core::ports::IOutcomeSink;

// ============================================================================
// OutcomeCollector
// ============================================================================

/// Counts and byte totals over a set of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub copies_submitted: u64,
    pub copies_succeeded: u64,
    pub copies_failed: u64,
    pub deletes_succeeded: u64,
    pub deletes_failed: u64,
    /// Bytes of copies that were submitted or succeeded
    pub bytes_copied: u64,
    /// Bytes of files that were deleted
    pub bytes_deleted: u64,
}

impl OutcomeSummary {
    /// Folds one copy outcome into the totals
    pub fn record_copy(&mut self, outcome: &CopyOutcome) {
        match outcome.status {
            OutcomeStatus::Submitted => {
                self.copies_submitted += 1;
                self.bytes_copied += outcome.size;
            }
            OutcomeStatus::Succeeded => {
                self.copies_succeeded += 1;
                self.bytes_copied += outcome.size;
            }
            OutcomeStatus::Failed => self.copies_failed += 1,
        }
    }

    /// Folds one delete outcome into the totals
    pub fn record_delete(&mut self, outcome: &DeleteOutcome) {
        if outcome.status.is_failed() {
            self.deletes_failed += 1;
        } else {
            self.deletes_succeeded += 1;
            self.bytes_deleted += outcome.size;
        }
    }

    #[must_use]
    pub fn failures(&self) -> u64 {
        self.copies_failed + self.deletes_failed
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures() > 0
    }
}

/// In-memory sink keeping every outcome in arrival order
#[derive(Debug, Default)]
pub struct OutcomeCollector {
    copies: Mutex<Vec<CopyOutcome>>,
    deletes: Mutex<Vec<DeleteOutcome>>,
}

impl OutcomeCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the copy outcomes recorded so far
    pub fn copies(&self) -> Vec<CopyOutcome> {
        self.copies
            .lock()
            .map(|copies| copies.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the delete outcomes recorded so far
    pub fn deletes(&self) -> Vec<DeleteOutcome> {
        self.deletes
            .lock()
            .map(|deletes| deletes.clone())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> OutcomeSummary {
        let mut summary = OutcomeSummary::default();
        for outcome in self.copies() {
            summary.record_copy(&outcome);
        }
        for outcome in self.deletes() {
            summary.record_delete(&outcome);
        }
        summary
    }
}

#[async_trait::async_trait]
impl IOutcomeSink for OutcomeCollector {
    async fn on_copy(&self, outcome: CopyOutcome) {
        if let Ok(mut copies) = self.copies.lock() {
            copies.push(outcome);
        }
    }

    async fn on_delete(&self, outcome: DeleteOutcome) {
        if let Ok(mut deletes) = self.deletes.lock() {
            deletes.push(outcome);
        }
    }
}

// ============================================================================
// ChannelOutcomeSink
// ============================================================================

/// An outcome as delivered over a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeEvent {
    Copy(CopyOutcome),
    Delete(DeleteOutcome),
}

/// Sink that forwards every outcome to an mpsc receiver
///
/// Sending waits for channel capacity, so a slow consumer slows the run
/// down instead of losing records. Once the receiver is gone records are
/// dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelOutcomeSink {
    tx: mpsc::Sender<OutcomeEvent>,
}

impl ChannelOutcomeSink {
    pub fn new(tx: mpsc::Sender<OutcomeEvent>) -> Self {
        Self { tx }
    }

    /// Creates a sink together with its receiving end
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutcomeEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    async fn send(&self, event: OutcomeEvent) {
        if self.tx.send(event).await.is_err() {
            warn!("Outcome receiver dropped, discarding record");
        }
    }
}

#[async_trait::async_trait]
impl IOutcomeSink for ChannelOutcomeSink {
    async fn on_copy(&self, outcome: CopyOutcome) {
        self.send(OutcomeEvent::Copy(outcome)).await;
    }

    async fn on_delete(&self, outcome: DeleteOutcome) {
        self.send(OutcomeEvent::Delete(outcome)).await;
    }
}
