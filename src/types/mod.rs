// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Jail identifiers and snapshot naming rules.

mod jail_id;
mod snapshot;

pub use jail_id::{JailId, JailIdError};
pub use snapshot::{is_managed, meta_date, snapshot_name};
