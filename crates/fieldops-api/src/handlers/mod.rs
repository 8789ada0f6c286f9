mod availability;
mod health;
mod insights;

pub use availability::check_availability;
pub use health::health_check;
pub use insights::{analyze, dismiss_insight, list_insights, list_runs, resolve_insight};
