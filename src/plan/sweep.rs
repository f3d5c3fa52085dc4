// ABOUTME: Selects historical jroll snapshots for deletion under keep-N.
// ABOUTME: Auto-triggers only past double excess; the base snapshot is never touched.

use crate::types::is_managed;

/// How the sweep flags translate into planning behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// No flag: sweep only when managed snapshots exceed 2 x keep.
    Auto,
    /// --sweep: always delete eligible snapshots.
    Demand,
    /// --no-sweep: never delete.
    Disabled,
}

impl SweepMode {
    pub fn from_flags(sweep: bool, no_sweep: bool) -> Self {
        match (sweep, no_sweep) {
            (true, _) => SweepMode::Demand,
            (_, true) => SweepMode::Disabled,
            _ => SweepMode::Auto,
        }
    }
}

/// Plan which snapshots to destroy on one target. `snapshots` is the
/// target's newest-first listing; the result is in deletion order
/// (oldest first). Only jroll-managed names are considered, everything
/// past the newest `keep` is a candidate, and `base` is always spared.
pub fn plan_sweep(snapshots: &[String], base: &str, keep: u32, mode: SweepMode) -> Vec<String> {
    if mode == SweepMode::Disabled || keep == 0 {
        return Vec::new();
    }

    let managed: Vec<&String> = snapshots.iter().filter(|s| is_managed(s)).collect();
    let keep = keep as usize;

    let commit = mode == SweepMode::Demand || managed.len() > 2 * keep;
    if !commit || managed.len() <= keep {
        return Vec::new();
    }

    managed[keep..]
        .iter()
        .filter(|s| s.as_str() != base)
        .rev()
        .map(|s| s.to_string())
        .collect()
}
