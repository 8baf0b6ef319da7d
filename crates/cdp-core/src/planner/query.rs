//! Tiered-evidence queries.
//!
//! A query combines the intervention tier (`do`) and the observation tier
//! (`inv`) against the model:
//!
//! ```text
//! P(Q | do(d), inv(e))  =  P_cut(d)(Q | d ∪ e)
//! ```
//!
//! where `cut(d)` severs every intervened node from its parents. The
//! `obs_only` escape hatch skips the cut and conditions the untouched joint
//! on everything, and the PCC path resolves do/inv conflicts with a
//! counterfactual table update instead of letting interventions shadow
//! observations.

use super::{value_grid, Planner, QueryKey};
use crate::adapter::ModelAdapter;
use crate::error::Result;
use cdp_model::{Assignment, Distribution, ModelError};
use std::collections::BTreeSet;
use std::slice;
use tracing::trace;

impl<M: ModelAdapter> Planner<M> {
    /// Conditional joint over `vars` under both evidence tiers.
    pub fn cdn_query(
        &mut self,
        vars: &[String],
        do_evidence: &Assignment,
        inv_evidence: &Assignment,
        pcc: bool,
        obs_only: bool,
    ) -> Result<Distribution> {
        let key = QueryKey {
            vars: vars.iter().cloned().collect(),
            do_evidence: do_evidence.clone(),
            inv_evidence: inv_evidence.clone(),
            pcc,
            obs_only,
        };
        if let Some(cached) = self.caches.queries.get(&key) {
            return Ok(cached.clone());
        }
        let result = if pcc {
            self.pcc_query(vars, do_evidence, inv_evidence)?
        } else {
            self.standard_query(vars, do_evidence, inv_evidence, obs_only)?
        };
        self.caches.queries.insert(key, result.clone());
        Ok(result)
    }

    fn standard_query(
        &self,
        vars: &[String],
        do_evidence: &Assignment,
        inv_evidence: &Assignment,
        obs_only: bool,
    ) -> Result<Distribution> {
        // Querying an intervened variable short-circuits: force it to a
        // point mass, cut it loose, and condition on the observations.
        let shared: Vec<String> = vars
            .iter()
            .filter(|v| do_evidence.contains_key(*v))
            .cloned()
            .collect();
        if !shared.is_empty() {
            let mut forced = self.model().clone();
            for var in &shared {
                forced.degenerate(var, do_evidence[var])?;
            }
            let cut = forced.cut_incoming(&shared)?;
            return Ok(cut.query(vars, inv_evidence)?);
        }

        let mut combined = inv_evidence.clone();
        combined.extend(do_evidence.iter().map(|(k, v)| (k.clone(), *v)));
        if obs_only {
            return Ok(self.model().query(vars, &combined)?);
        }
        let cut_nodes: Vec<String> = do_evidence.keys().cloned().collect();
        let cut = self.model().cut_incoming(&cut_nodes)?;
        Ok(cut.query(vars, &combined)?)
    }

    /// The post-counterfactual-conditioning query.
    ///
    /// When an intervention contradicts an earlier observation of the same
    /// node, the observation is not discarded: every table outside the
    /// antecedent's causal cone is refit to the observed world first, and
    /// only then is the intervention applied.
    fn pcc_query(
        &self,
        vars: &[String],
        do_evidence: &Assignment,
        inv_evidence: &Assignment,
    ) -> Result<Distribution> {
        let antecedents: Vec<String> = do_evidence
            .iter()
            .filter(|(node, value)| {
                inv_evidence
                    .get(*node)
                    .is_some_and(|observed| observed != *value)
            })
            .map(|(node, _)| node.clone())
            .collect();
        let mut antecedent_descendants = BTreeSet::new();
        for node in &antecedents {
            antecedent_descendants.extend(self.descendants_of(node));
        }

        let vars_to_update: Vec<String> = self
            .model()
            .nodes()
            .into_iter()
            .filter(|node| {
                !do_evidence.contains_key(node)
                    && !antecedent_descendants.contains(node)
                    && !inv_evidence.contains_key(node)
            })
            .collect();
        trace!(
            antecedents = ?antecedents,
            updating = vars_to_update.len(),
            "pcc table refit"
        );

        let mut updated = self.model().clone();
        for var in &vars_to_update {
            let parents = self.model().parents(var)?;
            let mut cards = Vec::with_capacity(parents.len());
            for parent in &parents {
                cards.push(self.model().cardinality(parent)?);
            }
            let cardinality = self.model().cardinality(var)?;
            for combo in value_grid(&cards) {
                let mut conditioning = inv_evidence.clone();
                for (parent, value) in parents.iter().zip(&combo) {
                    conditioning.insert(parent.clone(), *value);
                }
                let posterior = match self.model().query(slice::from_ref(var), &conditioning) {
                    Ok(dist) => dist,
                    // The observed world rules this parent combination out
                    // entirely; its row can never be selected, so keep it.
                    Err(ModelError::ZeroProbabilityEvidence) => continue,
                    Err(e) => return Err(e.into()),
                };
                let mut row = Vec::with_capacity(cardinality);
                for value in 0..cardinality {
                    let mut point = Assignment::new();
                    point.insert(var.clone(), value);
                    row.push(posterior.value(&point)?);
                }
                let mut parent_assignment = Assignment::new();
                for (parent, value) in parents.iter().zip(&combo) {
                    parent_assignment.insert(parent.clone(), *value);
                }
                updated.set_table_row(var, &parent_assignment, &row)?;
            }
        }

        let cut_nodes: Vec<String> = do_evidence.keys().cloned().collect();
        let cut = updated.cut_incoming(&cut_nodes)?;
        Ok(cut.query(vars, do_evidence)?)
    }
}
