//! Cache maintenance command implementation

use crate::cli::{CacheAction, CacheArgs};
use crate::output::OutputWriter;
use anyhow::Result;
use fieldops_scheduling::SchedulingServices;
use serde_json::json;

pub async fn execute(args: CacheArgs, services: &SchedulingServices, output: &OutputWriter) -> Result<()> {
    match args.action {
        CacheAction::Purge => {
            let purged = services.estimator.cache().purge_expired().await?;
            tracing::info!(purged, "Purged expired travel estimates");

            if output.is_json() {
                output.result(json!({ "purged": purged }))?;
            } else {
                output.success(format!("Purged {} expired travel estimate(s)", purged));
            }
            Ok(())
        }
    }
}
