//! Expectimax search over evidence tiers.
//!
//! Max nodes pick the best legal action; chance nodes branch on the
//! posterior of an investigated variable. Interventions and forfeitures are
//! deterministic, so their chance node has a single branch:
//!
//! ```text
//! V(s) = max_a Σ_o P(o | s) · V(s + a:o)      V(terminal) = EU(s)
//! ```
//!
//! There is no immediate reward; all value flows back from terminal
//! expected utility.

use super::{ChanceKey, MaxKey, Planner, SearchOptions};
use crate::action::{Action, ActionKind};
use crate::adapter::ModelAdapter;
use crate::error::Result;
use crate::evidence::{EvidenceTiers, PlanningState};
use cdp_model::Assignment;
use serde::Serialize;
use std::collections::BTreeMap;
use std::slice;
use tracing::trace;

/// Best action (if any) and its backed-up expected utility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub best_action: Option<Action>,
    pub expected_utility: f64,
}

/// One outgoing branch of a chance node.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub tiers: EvidenceTiers,
    pub probability: f64,
    /// The value observed on this branch, for investigations.
    pub observed: Option<usize>,
}

impl<M: ModelAdapter> Planner<M> {
    /// Full expectimax from the given evidence and time budget.
    pub fn expectimax_search(
        &mut self,
        tiers: &EvidenceTiers,
        time_remaining: u32,
        options: SearchOptions,
    ) -> Result<SearchOutcome> {
        self.max_node(tiers.clone(), time_remaining, options)
    }

    fn max_node(
        &mut self,
        tiers: EvidenceTiers,
        time_remaining: u32,
        options: SearchOptions,
    ) -> Result<SearchOutcome> {
        let key = MaxKey {
            tiers: tiers.clone(),
            time_remaining,
            options,
        };
        if let Some(cached) = self.caches.max_nodes.get(&key) {
            return Ok(cached.clone());
        }

        let legal: Vec<Action> = self
            .legal_actions(&tiers, time_remaining)
            .into_iter()
            .cloned()
            .collect();
        let outcome = if legal.is_empty() {
            let value = self.expected_utility(
                &tiers.do_evidence,
                &tiers.inv_evidence,
                options.pcc,
                options.obs_only,
            )?;
            SearchOutcome {
                best_action: None,
                expected_utility: value,
            }
        } else {
            let mut best_action = None;
            let mut best_value = f64::NEG_INFINITY;
            for action in legal {
                let value =
                    self.descend(&tiers, &action, time_remaining - action.time_cost, options)?;
                trace!(action = %action, value, time_remaining, "max node candidate");
                let replaces = value > best_value
                    // Ties go to investigations: information is free here.
                    || (value == best_value && action.kind == ActionKind::Inv);
                if replaces {
                    best_value = value;
                    best_action = Some(action);
                }
            }
            SearchOutcome {
                best_action,
                expected_utility: best_value,
            }
        };

        self.caches.max_nodes.insert(key, outcome.clone());
        Ok(outcome)
    }

    fn descend(
        &mut self,
        tiers: &EvidenceTiers,
        action: &Action,
        time_remaining: u32,
        options: SearchOptions,
    ) -> Result<f64> {
        let mut tiers = tiers.clone();
        // A causal intervention rewrites the mechanism of its node, so
        // everything previously learned about its descendants is stale.
        if options.method == super::SearchMethod::Causal {
            if let ActionKind::Do(_) = action.kind {
                tiers.purge_descendants(&self.descendants_of(&action.node));
            }
        }
        self.chance_node(&tiers, action.clone(), time_remaining, options)
    }

    /// Expected value of taking `action`, branching on what it reveals.
    /// Investigation branch tables are retained for plan extraction.
    pub fn chance_node(
        &mut self,
        tiers: &EvidenceTiers,
        action: Action,
        time_remaining: u32,
        options: SearchOptions,
    ) -> Result<f64> {
        let key = ChanceKey {
            tiers: tiers.clone(),
            action: action.clone(),
            time_remaining,
            options,
        };
        let transitions = self.transitions(tiers, &action, options)?;

        let mut branches = BTreeMap::new();
        let mut expected = 0.0;
        for transition in transitions {
            if transition.probability == 0.0 {
                continue;
            }
            if let Some(observed) = transition.observed {
                branches.insert(
                    observed,
                    PlanningState::new(transition.tiers.clone(), time_remaining),
                );
            }
            let child = self.max_node(transition.tiers, time_remaining, options)?;
            expected += transition.probability * child.expected_utility;
        }
        if action.kind == ActionKind::Inv {
            self.caches.chance_branches.insert(key, branches);
        }
        Ok(expected)
    }

    /// The successor distribution of one action from the given tiers.
    /// Interventions and forfeitures are deterministic; investigations
    /// branch on the node's posterior under current evidence.
    pub(crate) fn transitions(
        &mut self,
        tiers: &EvidenceTiers,
        action: &Action,
        options: SearchOptions,
    ) -> Result<Vec<Transition>> {
        match action.kind {
            ActionKind::Do(value) => {
                let mut next = tiers.clone();
                next.do_evidence.insert(action.node.clone(), value);
                Ok(vec![Transition {
                    tiers: next,
                    probability: 1.0,
                    observed: None,
                }])
            }
            ActionKind::DoNone => {
                let mut next = tiers.clone();
                next.do_none.insert(action.node.clone());
                Ok(vec![Transition {
                    tiers: next,
                    probability: 1.0,
                    observed: None,
                }])
            }
            ActionKind::InvNone => {
                let mut next = tiers.clone();
                next.inv_none.insert(action.node.clone());
                Ok(vec![Transition {
                    tiers: next,
                    probability: 1.0,
                    observed: None,
                }])
            }
            ActionKind::Inv => {
                let cardinality = self.model().cardinality(&action.node)?;
                let posterior = self.cdn_query(
                    slice::from_ref(&action.node),
                    &tiers.do_evidence,
                    &tiers.inv_evidence,
                    options.pcc,
                    options.obs_only,
                )?;
                let mut transitions = Vec::with_capacity(cardinality);
                for value in 0..cardinality {
                    let mut point = Assignment::new();
                    point.insert(action.node.clone(), value);
                    let probability = posterior.value(&point)?;
                    let mut next = tiers.clone();
                    next.inv_evidence.insert(action.node.clone(), value);
                    transitions.push(Transition {
                        tiers: next,
                        probability,
                        observed: Some(value),
                    });
                }
                Ok(transitions)
            }
        }
    }
}
