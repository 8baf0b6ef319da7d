//! Conditional probability tables.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// A conditional probability table for one discrete node.
///
/// Stored row-major: one row of `cardinality` probabilities per parent
/// combination, with the first parent varying slowest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalTable {
    node: String,
    cardinality: usize,
    parents: Vec<String>,
    parent_cards: Vec<usize>,
    values: Vec<f64>,
}

impl ConditionalTable {
    /// Table for a parentless node: a plain prior distribution.
    pub fn root(node: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let cardinality = values.len();
        Self::new(node, cardinality, Vec::new(), Vec::new(), values)
    }

    pub fn new(
        node: impl Into<String>,
        cardinality: usize,
        parents: Vec<String>,
        parent_cards: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let node = node.into();
        let rows: usize = parent_cards.iter().product();
        let expected = rows * cardinality;
        if parents.len() != parent_cards.len() || values.len() != expected {
            return Err(ModelError::TableShape {
                node,
                expected,
                got: values.len(),
            });
        }
        let table = Self {
            node,
            cardinality,
            parents,
            parent_cards,
            values,
        };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<()> {
        for row in self.values.chunks(self.cardinality) {
            if row.iter().any(|p| *p < 0.0) {
                return Err(ModelError::NegativeProbability {
                    node: self.node.clone(),
                });
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ModelError::RowNotNormalized {
                    node: self.node.clone(),
                    sum,
                });
            }
        }
        Ok(())
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn parent_cards(&self) -> &[usize] {
        &self.parent_cards
    }

    fn row_index(&self, parent_values: &[usize]) -> usize {
        debug_assert_eq!(parent_values.len(), self.parent_cards.len());
        parent_values
            .iter()
            .zip(&self.parent_cards)
            .fold(0, |acc, (v, card)| acc * card + v)
    }

    /// P(node = value | parents = parent_values).
    pub fn value(&self, value: usize, parent_values: &[usize]) -> f64 {
        self.values[self.row_index(parent_values) * self.cardinality + value]
    }

    pub fn row(&self, parent_values: &[usize]) -> &[f64] {
        let start = self.row_index(parent_values) * self.cardinality;
        &self.values[start..start + self.cardinality]
    }

    /// Replace one conditional row; the row must be a valid distribution.
    pub fn set_row(&mut self, parent_values: &[usize], row: &[f64]) -> Result<()> {
        if row.len() != self.cardinality {
            return Err(ModelError::TableShape {
                node: self.node.clone(),
                expected: self.cardinality,
                got: row.len(),
            });
        }
        if row.iter().any(|p| *p < 0.0) {
            return Err(ModelError::NegativeProbability {
                node: self.node.clone(),
            });
        }
        let sum: f64 = row.iter().sum();
        if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
            return Err(ModelError::RowNotNormalized {
                node: self.node.clone(),
                sum,
            });
        }
        let start = self.row_index(parent_values) * self.cardinality;
        self.values[start..start + self.cardinality].copy_from_slice(row);
        Ok(())
    }

    /// Collapse every row to a point mass at `value`.
    pub fn degenerate(&mut self, value: usize) -> Result<()> {
        if value >= self.cardinality {
            return Err(ModelError::ValueOutOfRange {
                node: self.node.clone(),
                value,
                cardinality: self.cardinality,
            });
        }
        for row in self.values.chunks_mut(self.cardinality) {
            for (v, p) in row.iter_mut().enumerate() {
                *p = if v == value { 1.0 } else { 0.0 };
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed() -> ConditionalTable {
        // P(B=1|A=0) = 0.8, P(B=1|A=1) = 0.2
        ConditionalTable::new(
            "B",
            2,
            vec!["A".into()],
            vec![2],
            vec![0.2, 0.8, 0.8, 0.2],
        )
        .expect("valid table")
    }

    #[test]
    fn test_row_addressing() {
        let table = skewed();
        assert_eq!(table.row(&[0]), &[0.2, 0.8]);
        assert_eq!(table.row(&[1]), &[0.8, 0.2]);
        assert_eq!(table.value(1, &[0]), 0.8);
    }

    #[test]
    fn test_unnormalized_row_rejected() {
        let err = ConditionalTable::root("A", vec![0.5, 0.6]).unwrap_err();
        assert!(matches!(err, ModelError::RowNotNormalized { .. }));
    }

    #[test]
    fn test_negative_probability_rejected() {
        let err = ConditionalTable::root("A", vec![-0.1, 1.1]).unwrap_err();
        assert!(matches!(err, ModelError::NegativeProbability { .. }));
    }

    #[test]
    fn test_set_row_validates_replacement() {
        let mut table = skewed();
        table.set_row(&[0], &[0.3, 0.7]).expect("valid row");
        assert_eq!(table.row(&[0]), &[0.3, 0.7]);

        let err = table.set_row(&[0], &[0.3, 0.3]).unwrap_err();
        assert!(matches!(err, ModelError::RowNotNormalized { .. }));
    }

    #[test]
    fn test_degenerate_collapses_every_row() {
        let mut table = skewed();
        table.degenerate(1).expect("value in range");
        assert_eq!(table.row(&[0]), &[0.0, 1.0]);
        assert_eq!(table.row(&[1]), &[0.0, 1.0]);
    }

    #[test]
    fn test_degenerate_out_of_range() {
        let mut table = skewed();
        assert!(matches!(
            table.degenerate(2),
            Err(ModelError::ValueOutOfRange { .. })
        ));
    }
}
