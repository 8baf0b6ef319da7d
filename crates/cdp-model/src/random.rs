//! Random regeneration of conditional tables.
//!
//! Useful for stress tests and for resampling a model's parameters while
//! keeping its graph structure. Planner caches keyed on query results must
//! be cleared after randomizing.

use crate::error::Result;
use crate::model::DiscreteCausalModel;
use crate::table::ConditionalTable;
use rand::Rng;

/// Draw a fresh table for `node` with uniform-random normalized rows,
/// preserving the node's cardinality and parent structure.
pub fn random_table<R: Rng + ?Sized>(
    model: &DiscreteCausalModel,
    node: &str,
    rng: &mut R,
) -> Result<ConditionalTable> {
    let current = model.table(node)?;
    let cardinality = current.cardinality();
    let rows: usize = current.parent_cards().iter().product();
    let mut values = Vec::with_capacity(rows * cardinality);
    for _ in 0..rows {
        let mut row: Vec<f64> = (0..cardinality)
            .map(|_| rng.random::<f64>().max(f64::MIN_POSITIVE))
            .collect();
        let sum: f64 = row.iter().sum();
        for p in &mut row {
            *p /= sum;
        }
        values.extend(row);
    }
    ConditionalTable::new(
        node,
        cardinality,
        current.parents().to_vec(),
        current.parent_cards().to_vec(),
        values,
    )
}

/// Resample every table in the model in place.
pub fn randomize_tables<R: Rng + ?Sized>(
    model: &mut DiscreteCausalModel,
    rng: &mut R,
) -> Result<()> {
    let nodes: Vec<String> = model.nodes().to_vec();
    for node in nodes {
        let table = random_table(model, &node, rng)?;
        model.replace_table(table)?;
    }
    Ok(())
}
