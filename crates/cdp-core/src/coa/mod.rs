//! Course-of-action plan extraction.
//!
//! After a search, the cached max and chance nodes are walked to produce a
//! nested plan: a sequence of action labels where each investigation step is
//! followed by a branch table mapping observed values to sub-plans.

pub mod tree;

pub use tree::CoaTree;

use crate::action::{Action, ActionKind};
use crate::adapter::ModelAdapter;
use crate::error::{PlannerError, Result};
use crate::evidence::EvidenceTiers;
use crate::planner::{ChanceKey, MaxKey, Planner, SearchMethod, SearchOptions};
use serde::Serialize;
use std::collections::BTreeMap;

/// One step of a plan: an action label, or the branch table after an
/// investigation keyed by the observed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CoaStep {
    Action(String),
    Branch(BTreeMap<usize, CoaPlan>),
}

pub type CoaPlan = Vec<CoaStep>;

impl<M: ModelAdapter> Planner<M> {
    /// Extract the plan rooted at the given evidence and time budget.
    ///
    /// Requires a prior [`Planner::expectimax_search`] from the same root
    /// with the same options; the plan is read out of the search caches.
    /// With `simplified`, branches whose sub-plans are structurally
    /// identical are collapsed away.
    pub fn generate_coa(
        &mut self,
        tiers: &EvidenceTiers,
        time_remaining: u32,
        options: SearchOptions,
        simplified: bool,
    ) -> Result<CoaPlan> {
        let plan = self.max_coa(tiers.clone(), time_remaining, options)?;
        if !simplified || plan.is_empty() {
            return Ok(plan);
        }
        Ok(CoaTree::from_plan(&plan).simplify().to_plan())
    }

    fn max_coa(
        &mut self,
        tiers: EvidenceTiers,
        time_remaining: u32,
        options: SearchOptions,
    ) -> Result<CoaPlan> {
        let key = MaxKey {
            tiers: tiers.clone(),
            time_remaining,
            options,
        };
        let outcome = self
            .caches
            .max_nodes
            .get(&key)
            .cloned()
            .ok_or_else(|| PlannerError::MissingSearchResult {
                context: format!("max node with {time_remaining} units of time remaining"),
            })?;
        let Some(action) = outcome.best_action else {
            return Ok(Vec::new());
        };

        let next_time = time_remaining - action.time_cost;
        match action.kind {
            ActionKind::Inv => self.branching_coa(tiers, action, next_time, options),
            ActionKind::Do(value) => {
                let mut tiers = tiers;
                if options.method == SearchMethod::Causal {
                    tiers.purge_descendants(&self.descendants_of(&action.node));
                }
                tiers.do_evidence.insert(action.node.clone(), value);
                self.linear_coa(action.label(), tiers, next_time, options)
            }
            ActionKind::DoNone => {
                let mut tiers = tiers;
                tiers.do_none.insert(action.node.clone());
                self.linear_coa(action.label(), tiers, next_time, options)
            }
            ActionKind::InvNone => {
                let mut tiers = tiers;
                tiers.inv_none.insert(action.node.clone());
                self.linear_coa(action.label(), tiers, next_time, options)
            }
        }
    }

    fn branching_coa(
        &mut self,
        tiers: EvidenceTiers,
        action: Action,
        next_time: u32,
        options: SearchOptions,
    ) -> Result<CoaPlan> {
        let key = ChanceKey {
            tiers,
            action: action.clone(),
            time_remaining: next_time,
            options,
        };
        let branches = self
            .caches
            .chance_branches
            .get(&key)
            .cloned()
            .ok_or_else(|| PlannerError::MissingBranchTable {
                action: action.label(),
            })?;
        let mut table = BTreeMap::new();
        for (observed, successor) in branches {
            let sub = self.max_coa(successor.tiers, successor.time_remaining, options)?;
            table.insert(observed, sub);
        }
        Ok(vec![CoaStep::Action(action.label()), CoaStep::Branch(table)])
    }

    fn linear_coa(
        &mut self,
        label: String,
        tiers: EvidenceTiers,
        next_time: u32,
        options: SearchOptions,
    ) -> Result<CoaPlan> {
        let mut plan = vec![CoaStep::Action(label)];
        plan.extend(self.max_coa(tiers, next_time, options)?);
        Ok(plan)
    }
}
