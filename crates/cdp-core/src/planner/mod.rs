//! The planner: query engine, expected utility, search, and policy solving.
//!
//! A [`Planner`] owns a model (through [`ModelAdapter`]), an action catalog,
//! and a utility function over a subset of model variables. All query,
//! utility, and search results are memoized; mutating the model through
//! [`Planner::model_mut`] drops the caches.

mod policy;
mod query;
mod search;
mod utility;

pub use policy::{PolicyIterationParams, PolicySolution};
pub use search::{SearchOutcome, Transition};

use crate::action::{legal_actions, Action, ActionCatalog, ActionKind};
use crate::adapter::ModelAdapter;
use crate::error::{PlannerError, Result};
use crate::evidence::{EvidenceTiers, PlanningState};
use cdp_model::{Assignment, Distribution};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Whether interventions are treated causally or as plain evidence.
///
/// Under `Causal`, intervening on a node severs it from its parents and
/// invalidates previously gathered evidence on its descendants. Under
/// `Evidential`, interventions condition the joint like any observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    Evidential,
    Causal,
}

/// Query and search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SearchOptions {
    pub method: SearchMethod,
    /// Resolve do/inv conflicts with the counterfactual update instead of
    /// letting interventions shadow observations.
    pub pcc: bool,
    /// Treat interventions as observations inside queries (no edge cuts).
    pub obs_only: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::causal()
    }
}

impl SearchOptions {
    pub fn causal() -> Self {
        Self {
            method: SearchMethod::Causal,
            pcc: false,
            obs_only: false,
        }
    }

    pub fn evidential() -> Self {
        Self {
            method: SearchMethod::Evidential,
            pcc: false,
            obs_only: false,
        }
    }

    pub fn with_pcc(mut self, pcc: bool) -> Self {
        self.pcc = pcc;
        self
    }

    pub fn with_obs_only(mut self, obs_only: bool) -> Self {
        self.obs_only = obs_only;
        self
    }
}

/// Utility over a full assignment to the utility nodes.
pub type UtilityFn = Box<dyn Fn(&Assignment) -> f64>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct QueryKey {
    pub vars: BTreeSet<String>,
    pub do_evidence: Assignment,
    pub inv_evidence: Assignment,
    pub pcc: bool,
    pub obs_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct UtilityKey {
    pub do_evidence: Assignment,
    pub inv_evidence: Assignment,
    pub pcc: bool,
    pub obs_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MaxKey {
    pub tiers: EvidenceTiers,
    pub time_remaining: u32,
    pub options: SearchOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ChanceKey {
    pub tiers: EvidenceTiers,
    pub action: Action,
    pub time_remaining: u32,
    pub options: SearchOptions,
}

#[derive(Debug, Default)]
pub(crate) struct PlannerCaches {
    pub queries: HashMap<QueryKey, Distribution>,
    pub utilities: HashMap<UtilityKey, f64>,
    pub max_nodes: HashMap<MaxKey, SearchOutcome>,
    /// Observed value → successor state, per investigated chance node.
    pub chance_branches: HashMap<ChanceKey, BTreeMap<usize, PlanningState>>,
}

impl PlannerCaches {
    pub fn clear(&mut self) {
        self.queries.clear();
        self.utilities.clear();
        self.max_nodes.clear();
        self.chance_branches.clear();
    }
}

pub struct Planner<M: ModelAdapter> {
    model: M,
    catalog: ActionCatalog,
    utility: UtilityFn,
    utility_nodes: BTreeSet<String>,
    descendants: BTreeMap<String, BTreeSet<String>>,
    pub(crate) caches: PlannerCaches,
}

impl<M: ModelAdapter> Planner<M> {
    pub fn new(
        model: M,
        catalog: ActionCatalog,
        utility: UtilityFn,
        utility_nodes: BTreeSet<String>,
    ) -> Result<Self> {
        let nodes: BTreeSet<String> = model.nodes().into_iter().collect();
        for node in &utility_nodes {
            if !nodes.contains(node) {
                return Err(PlannerError::UnknownUtilityNode(node.clone()));
            }
        }
        for action in catalog.actions() {
            if !nodes.contains(&action.node) {
                return Err(PlannerError::UnknownActionNode(action.node.clone()));
            }
            if let ActionKind::Do(value) = action.kind {
                let cardinality = model.cardinality(&action.node)?;
                if value >= cardinality {
                    return Err(PlannerError::InterventionOutOfRange {
                        node: action.node.clone(),
                        value,
                        cardinality,
                    });
                }
            }
        }
        let mut descendants = BTreeMap::new();
        for node in &nodes {
            descendants.insert(node.clone(), model.descendants(node)?);
        }
        Ok(Self {
            model,
            catalog,
            utility,
            utility_nodes,
            descendants,
            caches: PlannerCaches::default(),
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable model access. Cached query, utility, and search results are
    /// stale once the model changes, so they are dropped up front.
    pub fn model_mut(&mut self) -> &mut M {
        self.caches.clear();
        &mut self.model
    }

    pub fn invalidate_caches(&mut self) {
        self.caches.clear();
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn utility_nodes(&self) -> &BTreeSet<String> {
        &self.utility_nodes
    }

    pub fn legal_actions(&self, tiers: &EvidenceTiers, time_remaining: u32) -> Vec<&Action> {
        legal_actions(&self.catalog, tiers, time_remaining)
    }

    pub(crate) fn descendants_of(&self, node: &str) -> BTreeSet<String> {
        self.descendants.get(node).cloned().unwrap_or_default()
    }
}

/// All value combinations over the given cardinalities, first slot slowest.
/// Empty input yields the single empty combination.
pub(crate) fn value_grid(cards: &[usize]) -> Vec<Vec<usize>> {
    let mut grid = vec![Vec::new()];
    for &card in cards {
        let mut extended = Vec::with_capacity(grid.len() * card);
        for prefix in &grid {
            for value in 0..card {
                let mut combo = prefix.clone();
                combo.push(value);
                extended.push(combo);
            }
        }
        grid = extended;
    }
    grid
}
