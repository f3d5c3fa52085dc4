// ABOUTME: Pure planning logic run between discovery and execution.
// ABOUTME: Pillar assignment per data center and snapshot sweep selection.

mod pillar;
mod sweep;

pub use pillar::{DcEntry, PillarPlan, plan_pillars};
pub use sweep::{SweepMode, plan_sweep};
