use crate::stage::{StageGraph, StageId};

use super::runner::PipelineReport;

/// Log the execution plan, one line per level.
pub fn emit_execution_plan(graph: &StageGraph, levels: &[Vec<StageId>]) {
    let total: usize = levels.iter().map(|l| l.len()).sum();
    tracing::info!("execution plan: {} stage(s) in {} level(s)", total, levels.len());
    for (i, level) in levels.iter().enumerate() {
        let names: Vec<&str> = level
            .iter()
            .filter_map(|id| graph.get(*id))
            .map(|s| s.name())
            .collect();
        tracing::debug!("  level {}: {}", i, names.join(", "));
    }
}

pub fn emit_run_end(report: &PipelineReport) {
    tracing::info!(
        "pipeline finished: {} stage(s), {} skipped, {} completed, {} submitted, {} dry-run",
        report.order.len(),
        report.skipped.len(),
        report.completed.len(),
        report.submitted.len(),
        report.dry_run.len()
    );
}
