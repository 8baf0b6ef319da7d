//! Expected utility over the evidence tiers.
//!
//! ```text
//! EU(do, inv) = Σ_u P(u | do, inv) · U(u ∪ known)
//! ```
//!
//! where `u` ranges over utility nodes with no evidence yet. When every
//! utility node is pinned by evidence the expectation collapses to a single
//! utility evaluation.

use super::{Planner, UtilityKey};
use crate::adapter::ModelAdapter;
use crate::error::Result;
use cdp_model::Assignment;

impl<M: ModelAdapter> Planner<M> {
    pub fn expected_utility(
        &mut self,
        do_evidence: &Assignment,
        inv_evidence: &Assignment,
        pcc: bool,
        obs_only: bool,
    ) -> Result<f64> {
        let key = UtilityKey {
            do_evidence: do_evidence.clone(),
            inv_evidence: inv_evidence.clone(),
            pcc,
            obs_only,
        };
        if let Some(&cached) = self.caches.utilities.get(&key) {
            return Ok(cached);
        }

        let unknown: Vec<String> = self
            .utility_nodes()
            .iter()
            .filter(|node| !do_evidence.contains_key(*node) && !inv_evidence.contains_key(*node))
            .cloned()
            .collect();

        let mut combined = inv_evidence.clone();
        combined.extend(do_evidence.iter().map(|(k, v)| (k.clone(), *v)));

        let total = if unknown.is_empty() {
            combined.retain(|node, _| self.utility_nodes().contains(node));
            (self.utility)(&combined)
        } else {
            let joint = self.cdn_query(&unknown, do_evidence, inv_evidence, pcc, obs_only)?;
            let mut cards = Vec::with_capacity(unknown.len());
            for node in &unknown {
                cards.push(self.model().cardinality(node)?);
            }
            let mut total = 0.0;
            for combo in super::value_grid(&cards) {
                let assignment: Assignment = unknown
                    .iter()
                    .cloned()
                    .zip(combo.iter().copied())
                    .collect();
                let probability = joint.value(&assignment)?;
                if probability == 0.0 {
                    continue;
                }
                let mut evidence = combined.clone();
                evidence.extend(assignment);
                evidence.retain(|node, _| self.utility_nodes().contains(node));
                total += probability * (self.utility)(&evidence);
            }
            total
        };

        self.caches.utilities.insert(key, total);
        Ok(total)
    }
}
