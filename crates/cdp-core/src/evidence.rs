//! Tiered evidence and planning states.
//!
//! Evidence is held in four tiers: interventions (`do`), observations
//! (`inv`), and the two forfeiture tiers recording nodes the agent has
//! declined to intervene on or investigate. Forfeiture is one-way: once a
//! node is in a `*_none` tier, the corresponding action stays illegal for
//! the rest of the episode.

use cdp_model::Assignment;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct EvidenceTiers {
    pub do_evidence: Assignment,
    pub inv_evidence: Assignment,
    pub do_none: BTreeSet<String>,
    pub inv_none: BTreeSet<String>,
}

impl EvidenceTiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observations and interventions merged into one assignment.
    /// Interventions win when a node appears in both tiers.
    pub fn combined(&self) -> Assignment {
        let mut merged = self.inv_evidence.clone();
        merged.extend(self.do_evidence.iter().map(|(k, v)| (k.clone(), *v)));
        merged
    }

    /// Drop every listed node from all four tiers.
    pub fn purge_descendants(&mut self, nodes: &BTreeSet<String>) {
        self.do_evidence.retain(|node, _| !nodes.contains(node));
        self.inv_evidence.retain(|node, _| !nodes.contains(node));
        self.do_none.retain(|node| !nodes.contains(node));
        self.inv_none.retain(|node| !nodes.contains(node));
    }
}

/// Evidence tiers plus remaining time: the full search/policy state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PlanningState {
    pub tiers: EvidenceTiers,
    pub time_remaining: u32,
}

impl PlanningState {
    pub fn new(tiers: EvidenceTiers, time_remaining: u32) -> Self {
        Self {
            tiers,
            time_remaining,
        }
    }

    /// Fresh episode: no evidence, full time budget.
    pub fn initial(time_remaining: u32) -> Self {
        Self::new(EvidenceTiers::new(), time_remaining)
    }
}
