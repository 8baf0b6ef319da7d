//! Discrete causal model: a DAG of variables with one conditional table each.
//!
//! Queries are exact and work by enumerating the joint distribution:
//!
//! ```text
//! P(Q | e) ∝ Σ_{h} Π_v P(v | parents(v))
//! ```
//!
//! where the sum ranges over assignments consistent with the evidence `e`.
//! This is exponential in the number of variables, which is fine for the
//! model sizes the planner is built for.

use crate::distribution::{Assignment, Distribution};
use crate::error::{ModelError, Result};
use crate::table::ConditionalTable;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::slice;

/// A directed acyclic model over discrete variables.
///
/// Construction validates the graph (acyclicity, parent references, parent
/// cardinalities) and precomputes the topological order, children, and
/// descendant sets used by the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteCausalModel {
    /// Nodes in topological order.
    order: Vec<String>,
    /// Node → index into `order`.
    position: BTreeMap<String, usize>,
    tables: BTreeMap<String, ConditionalTable>,
    children: BTreeMap<String, Vec<String>>,
    descendants: BTreeMap<String, BTreeSet<String>>,
}

impl DiscreteCausalModel {
    pub fn new(tables: Vec<ConditionalTable>) -> Result<Self> {
        let mut by_node = BTreeMap::new();
        for table in tables {
            by_node.insert(table.node().to_string(), table);
        }

        let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut in_degree: BTreeMap<String, usize> = BTreeMap::new();
        for node in by_node.keys() {
            children.insert(node.clone(), Vec::new());
            in_degree.insert(node.clone(), 0);
        }
        for (node, table) in &by_node {
            for (parent, listed) in table.parents().iter().zip(table.parent_cards()) {
                let actual = by_node
                    .get(parent)
                    .ok_or_else(|| ModelError::UnknownNode(parent.clone()))?
                    .cardinality();
                if actual != *listed {
                    return Err(ModelError::ParentCardinalityMismatch {
                        node: node.clone(),
                        parent: parent.clone(),
                        listed: *listed,
                        actual,
                    });
                }
                children
                    .get_mut(parent)
                    .map(|c| c.push(node.clone()))
                    .ok_or_else(|| ModelError::UnknownNode(parent.clone()))?;
                *in_degree
                    .get_mut(node)
                    .ok_or_else(|| ModelError::UnknownNode(node.clone()))? += 1;
            }
        }

        // Kahn's algorithm; any leftover node sits on a cycle.
        let mut ready: VecDeque<String> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| n.clone())
            .collect();
        let mut order = Vec::with_capacity(by_node.len());
        while let Some(node) = ready.pop_front() {
            for child in &children[&node] {
                let degree = in_degree
                    .get_mut(child)
                    .ok_or_else(|| ModelError::UnknownNode(child.clone()))?;
                *degree -= 1;
                if *degree == 0 {
                    ready.push_back(child.clone());
                }
            }
            order.push(node);
        }
        if order.len() != by_node.len() {
            let on_cycle = by_node
                .keys()
                .find(|n| !order.contains(n))
                .cloned()
                .unwrap_or_default();
            return Err(ModelError::CyclicGraph { node: on_cycle });
        }

        let mut descendants: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for node in order.iter().rev() {
            let mut below = BTreeSet::new();
            for child in &children[node] {
                below.insert(child.clone());
                below.extend(descendants[child].iter().cloned());
            }
            descendants.insert(node.clone(), below);
        }

        let position = order
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        Ok(Self {
            order,
            position,
            tables: by_node,
            children,
            descendants,
        })
    }

    /// Nodes in topological order.
    pub fn nodes(&self) -> &[String] {
        &self.order
    }

    pub fn table(&self, node: &str) -> Result<&ConditionalTable> {
        self.tables
            .get(node)
            .ok_or_else(|| ModelError::UnknownNode(node.to_string()))
    }

    pub fn cardinality(&self, node: &str) -> Result<usize> {
        Ok(self.table(node)?.cardinality())
    }

    pub fn parents(&self, node: &str) -> Result<&[String]> {
        Ok(self.table(node)?.parents())
    }

    pub fn children(&self, node: &str) -> Result<&[String]> {
        self.children
            .get(node)
            .map(Vec::as_slice)
            .ok_or_else(|| ModelError::UnknownNode(node.to_string()))
    }

    /// Transitive closure of `children`.
    pub fn descendants(&self, node: &str) -> Result<&BTreeSet<String>> {
        self.descendants
            .get(node)
            .ok_or_else(|| ModelError::UnknownNode(node.to_string()))
    }

    /// Replace one conditional row of `node`'s table.
    pub fn set_row(&mut self, node: &str, parent_values: &[usize], row: &[f64]) -> Result<()> {
        self.tables
            .get_mut(node)
            .ok_or_else(|| ModelError::UnknownNode(node.to_string()))?
            .set_row(parent_values, row)
    }

    /// Collapse `node`'s table to a point mass at `value` in every row.
    pub fn degenerate(&mut self, node: &str, value: usize) -> Result<()> {
        self.tables
            .get_mut(node)
            .ok_or_else(|| ModelError::UnknownNode(node.to_string()))?
            .degenerate(value)
    }

    /// Swap in a new table for an existing node. The replacement must keep
    /// the node's cardinality and parent structure so the cached graph
    /// metadata stays valid.
    pub fn replace_table(&mut self, table: ConditionalTable) -> Result<()> {
        let node = table.node().to_string();
        let current = self.table(&node)?;
        if current.cardinality() != table.cardinality()
            || current.parents() != table.parents()
        {
            return Err(ModelError::IncompatibleReplacement { node });
        }
        self.tables.insert(node, table);
        Ok(())
    }

    fn joint_probability(&self, values: &[usize]) -> f64 {
        let mut product = 1.0;
        for (node, &value) in self.order.iter().zip(values) {
            let table = &self.tables[node];
            let parent_values: Vec<usize> = table
                .parents()
                .iter()
                .map(|p| values[self.position[p]])
                .collect();
            product *= table.value(value, &parent_values);
            if product == 0.0 {
                break;
            }
        }
        product
    }

    /// Exact conditional joint over `vars` given `evidence`.
    ///
    /// Evidence may mention a query variable; the result is then a point
    /// mass on the observed value. Evidence that the model assigns zero
    /// probability is an error.
    pub fn query(&self, vars: &[String], evidence: &Assignment) -> Result<Distribution> {
        for var in vars {
            if !self.position.contains_key(var) {
                return Err(ModelError::UnknownNode(var.clone()));
            }
        }
        let mut fixed: Vec<Option<usize>> = vec![None; self.order.len()];
        for (var, &value) in evidence {
            let pos = *self
                .position
                .get(var)
                .ok_or_else(|| ModelError::UnknownNode(var.clone()))?;
            let cardinality = self.tables[var].cardinality();
            if value >= cardinality {
                return Err(ModelError::ValueOutOfRange {
                    node: var.clone(),
                    value,
                    cardinality,
                });
            }
            fixed[pos] = Some(value);
        }

        let cards: Vec<usize> = self
            .order
            .iter()
            .map(|n| self.tables[n].cardinality())
            .collect();
        let qpos: Vec<usize> = vars.iter().map(|v| self.position[v]).collect();
        let qcards: Vec<usize> = qpos.iter().map(|&p| cards[p]).collect();

        let mut table = vec![0.0; qcards.iter().product()];
        let mut normalizer = 0.0;
        let total: usize = cards.iter().product();
        let mut values = vec![0usize; cards.len()];
        'outer: for code in 0..total {
            let mut rem = code;
            for i in (0..cards.len()).rev() {
                values[i] = rem % cards[i];
                rem /= cards[i];
            }
            for (i, f) in fixed.iter().enumerate() {
                if let Some(v) = f {
                    if values[i] != *v {
                        continue 'outer;
                    }
                }
            }
            let p = self.joint_probability(&values);
            if p == 0.0 {
                continue;
            }
            let index = qpos
                .iter()
                .zip(&qcards)
                .fold(0, |acc, (&pos, &card)| acc * card + values[pos]);
            table[index] += p;
            normalizer += p;
        }
        if normalizer <= 0.0 {
            return Err(ModelError::ZeroProbabilityEvidence);
        }
        for p in &mut table {
            *p /= normalizer;
        }
        Distribution::new(vars.to_vec(), qcards, table)
    }

    /// The intervention operator: sever each listed node from its parents.
    ///
    /// A cut node keeps its current marginal as a parentless prior, so
    /// downstream queries treat it as exogenous.
    pub fn cut_incoming(&self, nodes: &[String]) -> Result<Self> {
        for node in nodes {
            if !self.position.contains_key(node) {
                return Err(ModelError::UnknownNode(node.clone()));
            }
        }
        let mut tables = Vec::with_capacity(self.order.len());
        for node in &self.order {
            if nodes.contains(node) {
                let marginal = self.query(slice::from_ref(node), &Assignment::new())?;
                tables.push(ConditionalTable::root(
                    node.clone(),
                    marginal.values().to_vec(),
                )?);
            } else {
                tables.push(self.tables[node].clone());
            }
        }
        Self::new(tables)
    }
}
