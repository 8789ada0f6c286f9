//! Analyze command implementation

use crate::cli::AnalyzeArgs;
use crate::output::OutputWriter;
use crate::output_types::InsightRow;
use anyhow::Result;
use fieldops_core::models::{RunTrigger, TechnicianId};
use fieldops_scheduling::{AnalysisRequest, SchedulingServices};

pub async fn execute(args: AnalyzeArgs, services: &SchedulingServices, output: &OutputWriter) -> Result<()> {
    let trigger = if args.scheduled { RunTrigger::Scheduled } else { RunTrigger::Manual };
    let mut request = AnalysisRequest::new(args.from, args.to).with_trigger(trigger);
    if let Some(technician) = args.technician {
        request = request.with_technician(TechnicianId(technician));
    }

    let report = services.analyzer.analyze(&request).await?;

    if output.is_json() {
        output.result(&report)?;
        return Ok(());
    }

    output.section("Schedule Analysis");
    output.kv("Window", format!("{} .. {}", request.date_from, request.date_to));
    output.kv("Findings", report.generated);
    output.kv("Auto-dismissed", report.dismissed);
    output.kv("Enhanced", if report.enhanced { "yes" } else { "no" });
    output.kv("Took", format!("{} ms", report.run_log.duration_ms));

    if report.insights.is_empty() {
        output.success("No schedule risks found");
    } else {
        output.section("Open Insights");
        output.table(report.insights.iter().map(InsightRow::from).collect());
    }

    Ok(())
}
