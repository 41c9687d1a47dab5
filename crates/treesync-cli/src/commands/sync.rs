//! Sync command - Reconcile destinations with a source directory
//!
//! Provides the `treesync sync` CLI command which:
//! 1. Resolves the job from the configuration file or the arguments
//! 2. Creates the local storage adapter and a channel-backed outcome sink
//! 3. Runs the SyncCoordinator, printing outcomes as they arrive
//! 4. Disables the job on Ctrl+C so the run stops after the current file

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};
use treesync_core::domain::OutcomeStatus;
use treesync_core::ports::{IOutcomeSink, IStorageClient};
use treesync_sync::filesystem::LocalStorageClient;
use treesync_sync::sink::{ChannelOutcomeSink, OutcomeEvent, OutcomeSummary};
use treesync_sync::{SyncCoordinator, SyncRunState};

use super::JobArgs;
use crate::output::{format_bytes, get_formatter, OutputFormat, OutputFormatter};

/// Outcomes buffered between the engine and the printer
const OUTCOME_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(flatten)]
    pub target: JobArgs,
}

impl SyncCommand {
    /// Execute the sync command
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        let config = self.target.load_config(config_path)?;
        let resolved = self.target.resolve(&config)?;

        info!(
            job_id = %resolved.job.id,
            job = resolved.name.as_deref().unwrap_or("-"),
            source = %resolved.source,
            destinations = resolved.destinations.len(),
            method = %resolved.job.method,
            root = %resolved.root.display(),
            "Starting sync"
        );

        if !resolved.job.is_enabled() {
            formatter.warn(&format!(
                "Job '{}' is disabled in the configuration",
                resolved.name.as_deref().unwrap_or_default()
            ));
            return Ok(());
        }

        let client: Arc<dyn IStorageClient> = Arc::new(LocalStorageClient::new(&resolved.root));
        let (sink, mut rx) = ChannelOutcomeSink::channel(OUTCOME_CHANNEL_CAPACITY);
        let coordinator = SyncCoordinator::new(client, Arc::new(sink) as Arc<dyn IOutcomeSink>);

        let switch = resolved.job.switch.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping after the current file");
                switch.disable();
            }
        });

        let job = resolved.job.clone();
        let source = resolved.source.clone();
        let destinations = resolved.destinations.clone();
        let run = tokio::spawn(async move { coordinator.sync(&source, &destinations, &job).await });

        let mut summary = OutcomeSummary::default();
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            match &event {
                OutcomeEvent::Copy(outcome) => summary.record_copy(outcome),
                OutcomeEvent::Delete(outcome) => summary.record_delete(outcome),
            }
            if format.is_json() {
                events.push(event);
            } else {
                print_event(formatter.as_ref(), &event);
            }
        }

        let result = run.await.context("Sync task failed")?;
        interrupt.abort();
        let state = result?;

        if format.is_json() {
            let json = serde_json::json!({
                "job": resolved.name,
                "job_id": resolved.job.id.to_string(),
                "source": resolved.source,
                "destinations": resolved.destinations,
                "state": state,
                "summary": summary,
                "outcomes": events,
            });
            formatter.print_json(&json);
        } else {
            print_summary(formatter.as_ref(), state, &summary);
        }

        if summary.has_failures() {
            anyhow::bail!("{} file operation(s) failed", summary.failures());
        }
        Ok(())
    }
}

fn print_event(formatter: &dyn OutputFormatter, event: &OutcomeEvent) {
    match event {
        OutcomeEvent::Copy(outcome) => match outcome.status {
            OutcomeStatus::Succeeded => formatter.info(&format!(
                "copied   {} ({})",
                outcome.dst_path(),
                format_bytes(outcome.size)
            )),
            OutcomeStatus::Submitted => formatter.info(&format!(
                "queued   {} (task {})",
                outcome.dst_path(),
                outcome
                    .task_id
                    .as_ref()
                    .map(|id| id.as_str())
                    .unwrap_or_default()
            )),
            OutcomeStatus::Failed => formatter.warn(&format!(
                "copy failed: {}: {}",
                outcome.src_path(),
                outcome.error.as_deref().unwrap_or("unknown error")
            )),
        },
        OutcomeEvent::Delete(outcome) => {
            if outcome.status.is_failed() {
                formatter.warn(&format!(
                    "delete failed: {}: {}",
                    outcome.path(),
                    outcome.error.as_deref().unwrap_or("unknown error")
                ));
            } else {
                formatter.info(&format!("deleted  {}", outcome.path()));
            }
        }
    }
}

fn print_summary(formatter: &dyn OutputFormatter, state: SyncRunState, summary: &OutcomeSummary) {
    let copied = summary.copies_succeeded + summary.copies_submitted;
    let line = format!(
        "{} copied ({}), {} deleted, {} failed",
        copied,
        format_bytes(summary.bytes_copied),
        summary.deletes_succeeded,
        summary.failures()
    );

    match state {
        SyncRunState::Completed if summary.has_failures() => {
            formatter.warn(&format!("Sync finished with errors: {line}"));
        }
        SyncRunState::Completed => formatter.success(&format!("Sync completed: {line}")),
        SyncRunState::Cancelled => formatter.warn(&format!("Sync cancelled: {line}")),
    }
    if summary.copies_submitted > 0 {
        formatter.info(&format!(
            "{} copies were queued as remote tasks",
            summary.copies_submitted
        ));
    }
}
