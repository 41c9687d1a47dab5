//! Outcome sink port (driving side of progress reporting)
//!
//! The engine hands every per-file outcome to an [`IOutcomeSink`] as soon as
//! it is known, so callers can persist progress incrementally instead of
//! waiting for a run to end.
//!
//! ## Design Notes
//!
//! - Methods return nothing: a sink that cannot record an outcome must deal
//!   with it itself (log it, buffer it) rather than abort the walk.
//! - Outcomes arrive in walk order; for one destination every copy outcome
//!   precedes every delete outcome.

use crate::domain::outcome::{CopyOutcome, DeleteOutcome};

/// Receiver of per-file outcomes
#[async_trait::async_trait]
pub trait IOutcomeSink: Send + Sync {
    /// Called once per file the copy pass attempted
    async fn on_copy(&self, outcome: CopyOutcome);

    /// Called once per file the delete pass attempted
    async fn on_delete(&self, outcome: DeleteOutcome);
}
