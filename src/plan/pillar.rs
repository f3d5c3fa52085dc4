// ABOUTME: Assigns each member the host its dump copy is pulled from.
// ABOUTME: One WAN transfer per data center; later members copy intra-DC.

use crate::types::JailId;
use std::collections::BTreeMap;

/// One data center's entry in the pillar table.
#[derive(Debug, Clone)]
pub struct DcEntry {
    /// The jail whose host serves the dump to this DC's members.
    pub pillar: JailId,
    /// How many members pull their copy from this pillar.
    pub consumers: usize,
}

/// Pillar assignment for a cohort.
#[derive(Debug, Clone)]
pub struct PillarPlan {
    /// Per-member pillar, in member order.
    pub assignments: Vec<JailId>,
    /// DC table, keyed by data center tag. Dumps are reaped from every
    /// pillar host at the end of a deploy.
    pub dcs: BTreeMap<String, DcEntry>,
}

impl PillarPlan {
    /// Whether a member is itself the pillar of its DC.
    pub fn is_pillar(&self, member: &JailId) -> bool {
        self.dcs.values().any(|entry| entry.pillar == *member)
    }
}

/// Walk members in list order, seeding the table with the super's DC.
/// A member of a known DC pulls from that DC's pillar; the first member
/// of a new DC pulls from the super and becomes the DC's pillar.
pub fn plan_pillars<'a, I>(super_id: &JailId, super_dc: &str, members: I) -> PillarPlan
where
    I: IntoIterator<Item = (&'a JailId, &'a str)>,
{
    let mut dcs: BTreeMap<String, DcEntry> = BTreeMap::new();
    dcs.insert(
        super_dc.to_string(),
        DcEntry {
            pillar: super_id.clone(),
            consumers: 0,
        },
    );

    let mut assignments = Vec::new();
    for (id, dc) in members {
        if let Some(entry) = dcs.get_mut(dc) {
            entry.consumers += 1;
            assignments.push(entry.pillar.clone());
        } else {
            dcs.get_mut(super_dc)
                .expect("super DC is seeded above")
                .consumers += 1;
            dcs.insert(
                dc.to_string(),
                DcEntry {
                    pillar: id.clone(),
                    consumers: 0,
                },
            );
            assignments.push(super_id.clone());
        }
    }

    for (dc, entry) in &dcs {
        tracing::debug!(
            "dc '{}': pillar {}, {} consumer(s)",
            dc,
            entry.pillar,
            entry.consumers
        );
    }

    PillarPlan { assignments, dcs }
}
