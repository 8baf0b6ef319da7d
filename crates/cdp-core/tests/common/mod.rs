#![allow(dead_code)]

use cdp_core::{Action, ActionCatalog, Planner, UtilityFn};
use cdp_model::{Assignment, ConditionalTable, DiscreteCausalModel};
use std::collections::BTreeSet;

/// Route tracing output from tests through the standard subscriber; set
/// `CDP_LOG=trace` to watch the search expand.
pub fn init_test_logging() {
    cdp_core::logging::init_logging("warn");
}

pub fn assignment(pairs: &[(&str, usize)]) -> Assignment {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub fn nodes(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// A → B with P(B=1|A=0) = 0.8 and P(B=1|A=1) = 0.2: intervening on B is
/// causally inert for A, while observing A is informative about B.
pub fn chain_model() -> DiscreteCausalModel {
    DiscreteCausalModel::new(vec![
        ConditionalTable::root("A", vec![0.5, 0.5]).unwrap(),
        ConditionalTable::new("B", 2, vec!["A".into()], vec![2], vec![0.2, 0.8, 0.8, 0.2])
            .unwrap(),
    ])
    .unwrap()
}

pub fn chain_utility() -> UtilityFn {
    Box::new(|states: &Assignment| (2 * states["A"] + states["B"]) as f64)
}

pub fn chain_catalog() -> ActionCatalog {
    ActionCatalog::new(vec![
        Action::investigate("A", 1),
        Action::intervene("B", 0, 2),
        Action::intervene("B", 1, 2),
    ])
}

pub fn chain_planner() -> Planner<DiscreteCausalModel> {
    Planner::new(
        chain_model(),
        chain_catalog(),
        chain_utility(),
        nodes(&["A", "B"]),
    )
    .unwrap()
}

/// Same chain but with an asymmetric utility table, so evidential and
/// causal readings of do(B) diverge sharply.
pub fn confounding_model() -> DiscreteCausalModel {
    DiscreteCausalModel::new(vec![
        ConditionalTable::root("A", vec![0.5, 0.5]).unwrap(),
        ConditionalTable::new("B", 2, vec!["A".into()], vec![2], vec![0.2, 0.8, 0.5, 0.5])
            .unwrap(),
    ])
    .unwrap()
}

pub fn confounding_utility() -> UtilityFn {
    Box::new(|states: &Assignment| match (states["A"], states["B"]) {
        (0, 0) => 1.0,
        (0, 1) => 0.0,
        (1, 0) => 2.0,
        _ => 4.0,
    })
}

pub fn confounding_planner() -> Planner<DiscreteCausalModel> {
    Planner::new(
        confounding_model(),
        ActionCatalog::new(vec![Action::intervene("B", 1, 1)]),
        confounding_utility(),
        nodes(&["A", "B"]),
    )
    .unwrap()
}

/// U → A and U → B: a hidden common cause. Observing A moves B only
/// through U, so cutting A away leaves the updated belief about U intact.
pub fn confounder_model() -> DiscreteCausalModel {
    DiscreteCausalModel::new(vec![
        ConditionalTable::root("U", vec![0.5, 0.5]).unwrap(),
        ConditionalTable::new("A", 2, vec!["U".into()], vec![2], vec![0.1, 0.9, 0.9, 0.1])
            .unwrap(),
        ConditionalTable::new("B", 2, vec!["U".into()], vec![2], vec![0.1, 0.9, 0.9, 0.1])
            .unwrap(),
    ])
    .unwrap()
}

pub fn confounder_planner() -> Planner<DiscreteCausalModel> {
    Planner::new(
        confounder_model(),
        ActionCatalog::new(vec![Action::investigate("A", 1), Action::intervene("A", 1, 1)]),
        Box::new(|states: &Assignment| states["B"] as f64),
        nodes(&["B"]),
    )
    .unwrap()
}

/// Chain model where utility only reads B, with a catalog rich enough for
/// the plan to hedge: check B first, and only repair A if B came up bad.
pub fn double_check_planner() -> Planner<DiscreteCausalModel> {
    Planner::new(
        chain_model(),
        ActionCatalog::new(vec![
            Action::intervene("A", 0, 2),
            Action::intervene("A", 1, 2),
            Action::investigate("A", 1),
            Action::investigate("B", 1),
            Action::decline_investigation("B", 0),
        ]),
        Box::new(|states: &Assignment| states["B"] as f64),
        nodes(&["B"]),
    )
    .unwrap()
}

/// Chain model with cheap interventions on B, so investigating A first
/// ties with intervening outright and the resulting branches collapse.
pub fn collapse_planner() -> Planner<DiscreteCausalModel> {
    Planner::new(
        chain_model(),
        ActionCatalog::new(vec![
            Action::investigate("A", 1),
            Action::intervene("B", 0, 1),
            Action::intervene("B", 1, 1),
        ]),
        chain_utility(),
        nodes(&["A", "B"]),
    )
    .unwrap()
}
