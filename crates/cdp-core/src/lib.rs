//! Causal decision planner over discrete causal models.
//!
//! The planner keeps evidence in four tiers (interventions, observations,
//! and their forfeiture sets), answers conditional and counterfactual
//! queries against a pluggable model backend, scores evidence states by
//! expected utility, and plans with expectimax search or policy iteration.
//! Search results can be read back out as nested course-of-action plans,
//! optionally simplified by collapsing uninformative branches.
//!
//! Model access goes through [`ModelAdapter`]; the `cdp-model` crate ships
//! the bundled exact-enumeration backend.

pub mod action;
pub mod adapter;
pub mod coa;
pub mod error;
pub mod evidence;
pub mod logging;
pub mod planner;

pub use action::{legal_actions, Action, ActionCatalog, ActionKind};
pub use adapter::ModelAdapter;
pub use coa::{CoaPlan, CoaStep, CoaTree};
pub use error::{PlannerError, Result};
pub use evidence::{EvidenceTiers, PlanningState};
pub use planner::{
    Planner, PolicyIterationParams, PolicySolution, SearchMethod, SearchOptions, SearchOutcome,
    Transition, UtilityFn,
};
