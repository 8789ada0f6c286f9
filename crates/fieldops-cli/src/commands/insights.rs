//! Insights command implementation

use crate::cli::{InsightsAction, InsightsArgs, ListInsightsArgs, TransitionArgs};
use crate::output::OutputWriter;
use crate::output_types::{InsightRow, RunRow};
use anyhow::{Context, Result};
use fieldops_core::models::{InsightFilter, InsightId, InsightKind, InsightStatus, TechnicianId};
use fieldops_scheduling::SchedulingServices;

/// Runs shown under the insight listing
const RECENT_RUNS: usize = 5;

pub async fn execute(args: InsightsArgs, services: &SchedulingServices, output: &OutputWriter) -> Result<()> {
    match args.action {
        InsightsAction::List(args) => list(args, services, output).await,
        InsightsAction::Resolve(args) => transition(args, InsightStatus::Resolved, services, output).await,
        InsightsAction::Dismiss(args) => transition(args, InsightStatus::Dismissed, services, output).await,
    }
}

async fn list(args: ListInsightsArgs, services: &SchedulingServices, output: &OutputWriter) -> Result<()> {
    let mut filter = InsightFilter::new();
    if let Some(status) = args.status {
        filter = filter.with_status(status.parse::<InsightStatus>()?);
    }
    if let Some(kind) = args.kind {
        filter = filter.with_kind(kind.parse::<InsightKind>()?);
    }
    if let Some(technician) = args.technician {
        filter = filter.with_technician(TechnicianId(technician));
    }
    filter.date_from = args.from;
    filter.date_to = args.to;

    let insights = services.analyzer.list(&filter).await?;

    if output.is_json() {
        output.result(&insights)?;
        return Ok(());
    }

    output.section(format!("Insights ({})", insights.len()));
    output.table(insights.iter().map(InsightRow::from).collect());

    let runs = services.analyzer.recent_runs(RECENT_RUNS).await?;
    if !runs.is_empty() {
        output.section("Recent Runs");
        output.table(runs.iter().map(RunRow::from).collect());
    }

    Ok(())
}

async fn transition(
    args: TransitionArgs,
    to: InsightStatus,
    services: &SchedulingServices,
    output: &OutputWriter,
) -> Result<()> {
    let id: InsightId = args.id.parse().with_context(|| format!("Invalid insight ID '{}'", args.id))?;

    let insight = match to {
        InsightStatus::Resolved => services.analyzer.resolve(id, args.note).await?,
        _ => services.analyzer.dismiss(id, args.note).await?,
    };

    if output.is_json() {
        output.result(&insight)?;
    } else {
        output.success(format!("Insight {} is now {}", insight.id, insight.status));
    }

    Ok(())
}
