use cdp_model::{randomize_tables, Assignment, ConditionalTable, DiscreteCausalModel};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn chain() -> DiscreteCausalModel {
    DiscreteCausalModel::new(vec![
        ConditionalTable::root("A", vec![0.5, 0.5]).unwrap(),
        ConditionalTable::new("B", 2, vec!["A".into()], vec![2], vec![0.2, 0.8, 0.8, 0.2])
            .unwrap(),
        ConditionalTable::new(
            "C",
            3,
            vec!["B".into()],
            vec![2],
            vec![0.1, 0.3, 0.6, 0.5, 0.25, 0.25],
        )
        .unwrap(),
    ])
    .unwrap()
}

proptest! {
    #[test]
    fn queries_are_normalized(seed in any::<u64>(), b in 0usize..2) {
        let mut model = chain();
        let mut rng = StdRng::seed_from_u64(seed);
        randomize_tables(&mut model, &mut rng).unwrap();

        let mut evidence = Assignment::new();
        evidence.insert("B".into(), b);
        let dist = model
            .query(&["A".to_string(), "C".to_string()], &evidence)
            .unwrap();
        let sum: f64 = dist.values().iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
        prop_assert!(dist.values().iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn cutting_preserves_the_cut_marginal(seed in any::<u64>()) {
        let mut model = chain();
        let mut rng = StdRng::seed_from_u64(seed);
        randomize_tables(&mut model, &mut rng).unwrap();

        let before = model.query(&["B".to_string()], &Assignment::new()).unwrap();
        let cut = model.cut_incoming(&["B".to_string()]).unwrap();
        let after = cut.query(&["B".to_string()], &Assignment::new()).unwrap();
        for (x, y) in before.values().iter().zip(after.values()) {
            prop_assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn conditioning_on_a_cut_cause_is_inert_downstream(seed in any::<u64>(), b in 0usize..2) {
        let mut model = chain();
        let mut rng = StdRng::seed_from_u64(seed);
        randomize_tables(&mut model, &mut rng).unwrap();

        // Cutting B severs the A → B edge, so B carries no information
        // about A afterwards.
        let cut = model.cut_incoming(&["B".to_string()]).unwrap();
        let prior = cut.query(&["A".to_string()], &Assignment::new()).unwrap();
        let mut evidence = Assignment::new();
        evidence.insert("B".into(), b);
        let posterior = cut.query(&["A".to_string()], &evidence).unwrap();
        for (x, y) in prior.values().iter().zip(posterior.values()) {
            prop_assert!((x - y).abs() < 1e-9);
        }
    }
}
