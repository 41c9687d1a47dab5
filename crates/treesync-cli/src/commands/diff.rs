//! Diff command - Show what a sync would change, without changing anything

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;
use treesync_core::ports::{IOutcomeSink, IStorageClient};
use treesync_sync::engine::DestinationPlan;
use treesync_sync::filesystem::LocalStorageClient;
use treesync_sync::sink::OutcomeCollector;
use treesync_sync::SyncCoordinator;

use super::JobArgs;
use crate::output::{format_bytes, get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct DiffCommand {
    #[command(flatten)]
    pub target: JobArgs,
}

impl DiffCommand {
    /// Execute the diff command
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        let config = self.target.load_config(config_path)?;
        let resolved = self.target.resolve(&config)?;

        info!(source = %resolved.source, "Planning sync");

        let client: Arc<dyn IStorageClient> = Arc::new(LocalStorageClient::new(&resolved.root));
        let sink: Arc<dyn IOutcomeSink> = Arc::new(OutcomeCollector::new());
        let plans = SyncCoordinator::new(client, sink)
            .plan(&resolved.source, &resolved.destinations, &resolved.job)
            .await?;

        if format.is_json() {
            let json = serde_json::json!({
                "source": resolved.source,
                "method": resolved.job.method.to_string(),
                "destinations": plans,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        for plan in &plans {
            print_plan(formatter.as_ref(), plan);
        }
        Ok(())
    }
}

fn print_plan(formatter: &dyn OutputFormatter, plan: &DestinationPlan) {
    let copies = plan.copy.tree.files();
    let deletes = plan.delete.files();

    if copies.is_empty() && deletes.is_empty() && plan.copy.conflicts.is_empty() {
        formatter.success(&format!("{} is up to date", plan.destination));
        return;
    }

    formatter.success(&format!(
        "{}: {} to copy ({}), {} to delete",
        plan.destination,
        copies.len(),
        format_bytes(plan.copy.tree.total_size()),
        deletes.len()
    ));
    for (path, size) in &copies {
        formatter.info(&format!("+ {path} ({})", format_bytes(*size)));
    }
    for (path, _) in &deletes {
        formatter.info(&format!("- {path}"));
    }
    for conflict in &plan.copy.conflicts {
        formatter.warn(&format!(
            "{}: {} in source, {} in destination",
            conflict.relative_path(),
            conflict.source_kind,
            conflict.dest_kind
        ));
    }
}
