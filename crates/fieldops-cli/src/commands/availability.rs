//! Availability command implementation

use crate::cli::AvailabilityArgs;
use crate::output::OutputWriter;
use crate::output_types::{AvailabilityOutput, DayRow};
use anyhow::{Context, Result};
use chrono::NaiveTime;
use fieldops_core::models::{AvailabilityRequest, TechnicianId};
use fieldops_scheduling::SchedulingServices;

pub async fn execute(args: AvailabilityArgs, services: &SchedulingServices, output: &OutputWriter) -> Result<()> {
    let time = NaiveTime::parse_from_str(&args.time, "%H:%M")
        .with_context(|| format!("Invalid --time '{}': expected HH:MM", args.time))?;

    let mut request = AvailabilityRequest::new(args.from, args.to, time, args.duration);
    request.location = args.location;
    request.technician_id = args.technician.map(TechnicianId);

    let days = services.availability.get_available_days(&request).await?;
    let available_count = days.iter().filter(|d| d.available).count();

    if output.is_json() {
        output.result(AvailabilityOutput { days, available_count })?;
    } else {
        output.section("Availability");
        output.kv("Window", format!("{} .. {}", request.date_from, request.date_to));
        output.kv("Start", format!("{} for {}h", request.time.format("%H:%M"), request.duration_hours));
        if let Some(location) = &request.location {
            output.kv("Location", location);
        }
        output.table(days.iter().map(DayRow::from).collect());
        output.kv("Available days", format!("{} of {}", available_count, days.len()));
    }

    Ok(())
}
