// ABOUTME: Snapshot naming helpers for the jroll.* series.
// ABOUTME: Only snapshots matching this pattern are ever created or swept.

use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::LazyLock;

static MANAGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^jroll\.\d{4}-\d{2}-\d{2}\.\d{2}:\d{2}:\d{2}$")
        .expect("constant regex pattern is valid")
});

/// Snapshot suffix for a deployment started at `now`, local time.
pub fn snapshot_name(now: DateTime<Local>) -> String {
    format!("jroll.{}", now.format("%Y-%m-%d.%H:%M:%S"))
}

/// Whether a snapshot suffix belongs to the jroll series. The sweep
/// planner must never touch anything else.
pub fn is_managed(suffix: &str) -> bool {
    MANAGED.is_match(suffix)
}

/// Timestamp format used in the deployment meta file.
pub fn meta_date(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}
