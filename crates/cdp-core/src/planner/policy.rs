//! Policy iteration over the reachable planning states.
//!
//! The state space is enumerated structurally (every way the tiers can
//! evolve under the catalog), then classic policy iteration runs over it:
//!
//! ```text
//! V(s) = γ · Σ_{s'} P(s' | s, π(s)) · V(s')       V(terminal) = EU(s)
//! ```
//!
//! There is no immediate reward; as in the search, all value enters at
//! terminal states. Transition probabilities for investigations come from
//! the same tiered queries the search uses.

use super::{Planner, SearchOptions};
use crate::action::{Action, ActionKind};
use crate::adapter::ModelAdapter;
use crate::error::Result;
use crate::evidence::PlanningState;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyIterationParams {
    /// Discount applied per action taken.
    pub gamma: f64,
    pub max_iterations: usize,
    pub eval_max_iterations: usize,
    pub eval_tolerance: f64,
}

impl Default for PolicyIterationParams {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            max_iterations: 1000,
            eval_max_iterations: 1000,
            eval_tolerance: 1e-6,
        }
    }
}

/// A solved policy: one action (or terminal `None`) and one value per
/// reachable state.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySolution {
    pub policy: HashMap<PlanningState, Option<Action>>,
    pub values: HashMap<PlanningState, f64>,
}

impl PolicySolution {
    pub fn action(&self, state: &PlanningState) -> Option<&Action> {
        self.policy.get(state).and_then(|a| a.as_ref())
    }

    pub fn value(&self, state: &PlanningState) -> Option<f64> {
        self.values.get(state).copied()
    }
}

impl<M: ModelAdapter> Planner<M> {
    /// Every state reachable from `initial` under the catalog.
    ///
    /// Enumeration is purely structural: an investigation fans out over all
    /// values of its node regardless of probability, so the state set never
    /// depends on the model's parameters.
    pub fn reachable_states(&self, initial: &PlanningState) -> Result<Vec<PlanningState>> {
        let mut visited = HashSet::new();
        let mut frontier = VecDeque::new();
        visited.insert(initial.clone());
        frontier.push_back(initial.clone());
        let mut states = Vec::new();
        while let Some(state) = frontier.pop_front() {
            for action in self.legal_actions(&state.tiers, state.time_remaining) {
                let next_time = state.time_remaining - action.time_cost;
                let mut successors = Vec::new();
                match action.kind {
                    ActionKind::Do(value) => {
                        let mut tiers = state.tiers.clone();
                        tiers.do_evidence.insert(action.node.clone(), value);
                        successors.push(PlanningState::new(tiers, next_time));
                    }
                    ActionKind::DoNone => {
                        let mut tiers = state.tiers.clone();
                        tiers.do_none.insert(action.node.clone());
                        successors.push(PlanningState::new(tiers, next_time));
                    }
                    ActionKind::InvNone => {
                        let mut tiers = state.tiers.clone();
                        tiers.inv_none.insert(action.node.clone());
                        successors.push(PlanningState::new(tiers, next_time));
                    }
                    ActionKind::Inv => {
                        for value in 0..self.model().cardinality(&action.node)? {
                            let mut tiers = state.tiers.clone();
                            tiers.inv_evidence.insert(action.node.clone(), value);
                            successors.push(PlanningState::new(tiers, next_time));
                        }
                    }
                }
                for successor in successors {
                    if visited.insert(successor.clone()) {
                        frontier.push_back(successor);
                    }
                }
            }
            states.push(state);
        }
        Ok(states)
    }

    pub fn policy_iteration(
        &mut self,
        initial: &PlanningState,
        options: SearchOptions,
        params: &PolicyIterationParams,
    ) -> Result<PolicySolution> {
        let states = self.reachable_states(initial)?;
        debug!(states = states.len(), "policy iteration state space");

        let mut rng = rand::rng();
        let mut policy: HashMap<PlanningState, Option<Action>> = HashMap::new();
        for state in &states {
            let legal: Vec<Action> = self
                .legal_actions(&state.tiers, state.time_remaining)
                .into_iter()
                .cloned()
                .collect();
            policy.insert(state.clone(), legal.choose(&mut rng).cloned());
        }

        let mut values: HashMap<PlanningState, f64> =
            states.iter().map(|s| (s.clone(), 0.0)).collect();
        for iteration in 0..params.max_iterations {
            self.policy_evaluation(&states, &policy, &mut values, options, params)?;
            let improved = self.policy_improvement(&states, &values, options, params)?;
            if improved == policy {
                debug!(iteration, "policy iteration converged");
                break;
            }
            policy = improved;
        }

        Ok(PolicySolution { policy, values })
    }

    fn policy_evaluation(
        &mut self,
        states: &[PlanningState],
        policy: &HashMap<PlanningState, Option<Action>>,
        values: &mut HashMap<PlanningState, f64>,
        options: SearchOptions,
        params: &PolicyIterationParams,
    ) -> Result<()> {
        for _ in 0..params.eval_max_iterations {
            let mut delta = 0.0f64;
            for state in states {
                let updated = match policy.get(state).and_then(|a| a.as_ref()) {
                    None => self.expected_utility(
                        &state.tiers.do_evidence,
                        &state.tiers.inv_evidence,
                        options.pcc,
                        options.obs_only,
                    )?,
                    Some(action) => {
                        self.action_value(state, action, values, options, params)?
                    }
                };
                let previous = values.insert(state.clone(), updated).unwrap_or(0.0);
                delta = delta.max((updated - previous).abs());
            }
            if delta < params.eval_tolerance {
                break;
            }
        }
        Ok(())
    }

    fn policy_improvement(
        &mut self,
        states: &[PlanningState],
        values: &HashMap<PlanningState, f64>,
        options: SearchOptions,
        params: &PolicyIterationParams,
    ) -> Result<HashMap<PlanningState, Option<Action>>> {
        let mut improved = HashMap::new();
        for state in states {
            let legal: Vec<Action> = self
                .legal_actions(&state.tiers, state.time_remaining)
                .into_iter()
                .cloned()
                .collect();
            let mut best: Option<Action> = None;
            let mut best_value = f64::NEG_INFINITY;
            for action in legal {
                let value = self.action_value(state, &action, values, options, params)?;
                if value > best_value {
                    best_value = value;
                    best = Some(action);
                }
            }
            improved.insert(state.clone(), best);
        }
        Ok(improved)
    }

    fn action_value(
        &mut self,
        state: &PlanningState,
        action: &Action,
        values: &HashMap<PlanningState, f64>,
        options: SearchOptions,
        params: &PolicyIterationParams,
    ) -> Result<f64> {
        let next_time = state.time_remaining - action.time_cost;
        let mut total = 0.0;
        for transition in self.transitions(&state.tiers, action, options)? {
            if transition.probability == 0.0 {
                continue;
            }
            let successor = PlanningState::new(transition.tiers, next_time);
            total += transition.probability * values.get(&successor).copied().unwrap_or(0.0);
        }
        Ok(params.gamma * total)
    }
}
