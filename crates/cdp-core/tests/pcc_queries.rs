mod common;

use cdp_model::Assignment;
use common::{assignment, chain_planner, confounder_planner};

const EPSILON: f64 = 1e-9;

#[test]
fn querying_an_intervened_variable_is_a_point_mass() {
    let mut planner = chain_planner();
    let dist = planner
        .cdn_query(
            &["B".to_string()],
            &assignment(&[("B", 1)]),
            &Assignment::new(),
            false,
            false,
        )
        .unwrap();
    assert_eq!(dist.values(), &[0.0, 1.0]);
}

#[test]
fn standard_query_lets_the_intervention_shadow_the_observation() {
    let mut planner = confounder_planner();
    // Conflicting evidence on A: observed 0, then forced to 1. Without
    // counterfactual conditioning the observation is discarded, and B
    // reverts to its prior.
    let dist = planner
        .cdn_query(
            &["B".to_string()],
            &assignment(&[("A", 1)]),
            &assignment(&[("A", 0)]),
            false,
            false,
        )
        .unwrap();
    assert!((dist.values()[1] - 0.5).abs() < EPSILON);
}

#[test]
fn pcc_query_keeps_what_the_observation_taught_us() {
    let mut planner = confounder_planner();
    // Observing A=0 makes U=1 likely (0.9); forcing A afterwards cannot
    // undo that. P(B=1) = 0.1·0.9 + 0.9·0.1 = 0.18.
    let dist = planner
        .cdn_query(
            &["B".to_string()],
            &assignment(&[("A", 1)]),
            &assignment(&[("A", 0)]),
            true,
            false,
        )
        .unwrap();
    assert!((dist.values()[1] - 0.18).abs() < EPSILON);
}

#[test]
fn pcc_without_conflicts_matches_the_standard_query() {
    let mut planner = confounder_planner();
    let standard = planner
        .cdn_query(
            &["B".to_string()],
            &Assignment::new(),
            &assignment(&[("A", 0)]),
            false,
            false,
        )
        .unwrap();
    let pcc = planner
        .cdn_query(
            &["B".to_string()],
            &Assignment::new(),
            &assignment(&[("A", 0)]),
            true,
            false,
        )
        .unwrap();
    for (a, b) in standard.values().iter().zip(pcc.values()) {
        assert!((a - b).abs() < EPSILON);
    }
}
