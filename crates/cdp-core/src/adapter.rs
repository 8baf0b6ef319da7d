//! Model boundary consumed by the planner.
//!
//! The planner never touches a model implementation directly; everything it
//! needs is expressed through [`ModelAdapter`]. The bundled
//! [`DiscreteCausalModel`] satisfies it out of the box, and an alternative
//! backend only has to provide the same semantics: exact conditional queries
//! and the cut-incoming-edges intervention operator.

use cdp_model::{Assignment, DiscreteCausalModel, Distribution, ModelError};
use std::collections::BTreeSet;

pub trait ModelAdapter: Clone {
    /// All model variables, in a stable order.
    fn nodes(&self) -> Vec<String>;

    fn cardinality(&self, node: &str) -> Result<usize, ModelError>;

    fn parents(&self, node: &str) -> Result<Vec<String>, ModelError>;

    /// Transitive closure of the node's children.
    fn descendants(&self, node: &str) -> Result<BTreeSet<String>, ModelError>;

    /// Exact conditional joint P(vars | evidence).
    fn query(&self, vars: &[String], evidence: &Assignment) -> Result<Distribution, ModelError>;

    /// A copy of the model with each listed node severed from its parents.
    fn cut_incoming(&self, nodes: &[String]) -> Result<Self, ModelError>;

    /// Collapse a node's table to a point mass at `value`.
    fn degenerate(&mut self, node: &str, value: usize) -> Result<(), ModelError>;

    /// Replace the conditional row selected by a full assignment to the
    /// node's parents.
    fn set_table_row(
        &mut self,
        node: &str,
        parent_values: &Assignment,
        row: &[f64],
    ) -> Result<(), ModelError>;
}

impl ModelAdapter for DiscreteCausalModel {
    fn nodes(&self) -> Vec<String> {
        DiscreteCausalModel::nodes(self).to_vec()
    }

    fn cardinality(&self, node: &str) -> Result<usize, ModelError> {
        DiscreteCausalModel::cardinality(self, node)
    }

    fn parents(&self, node: &str) -> Result<Vec<String>, ModelError> {
        Ok(DiscreteCausalModel::parents(self, node)?.to_vec())
    }

    fn descendants(&self, node: &str) -> Result<BTreeSet<String>, ModelError> {
        Ok(DiscreteCausalModel::descendants(self, node)?.clone())
    }

    fn query(&self, vars: &[String], evidence: &Assignment) -> Result<Distribution, ModelError> {
        DiscreteCausalModel::query(self, vars, evidence)
    }

    fn cut_incoming(&self, nodes: &[String]) -> Result<Self, ModelError> {
        DiscreteCausalModel::cut_incoming(self, nodes)
    }

    fn degenerate(&mut self, node: &str, value: usize) -> Result<(), ModelError> {
        DiscreteCausalModel::degenerate(self, node, value)
    }

    fn set_table_row(
        &mut self,
        node: &str,
        parent_values: &Assignment,
        row: &[f64],
    ) -> Result<(), ModelError> {
        let parents = DiscreteCausalModel::parents(self, node)?.to_vec();
        let mut ordered = Vec::with_capacity(parents.len());
        for parent in &parents {
            let value = *parent_values
                .get(parent)
                .ok_or_else(|| ModelError::MissingAssignment(parent.clone()))?;
            ordered.push(value);
        }
        self.set_row(node, &ordered, row)
    }
}
