//! Normalized joint distributions returned by model queries.

use crate::error::{ModelError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Variable → value map used for evidence and assignments throughout.
pub type Assignment = BTreeMap<String, usize>;

/// A normalized joint distribution over one or more query variables.
///
/// Values are stored in mixed-radix order with the first variable varying
/// slowest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    vars: Vec<String>,
    cards: Vec<usize>,
    values: Vec<f64>,
}

impl Distribution {
    pub fn new(vars: Vec<String>, cards: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let expected: usize = cards.iter().product();
        if vars.len() != cards.len() || values.len() != expected {
            return Err(ModelError::TableShape {
                node: vars.join(","),
                expected,
                got: values.len(),
            });
        }
        Ok(Self {
            vars,
            cards,
            values,
        })
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Probability of a full assignment to the query variables.
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        let mut index = 0usize;
        for (var, card) in self.vars.iter().zip(&self.cards) {
            let v = *assignment
                .get(var)
                .ok_or_else(|| ModelError::MissingAssignment(var.clone()))?;
            if v >= *card {
                return Err(ModelError::ValueOutOfRange {
                    node: var.clone(),
                    value: v,
                    cardinality: *card,
                });
            }
            index = index * card + v;
        }
        Ok(self.values[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(pairs: &[(&str, usize)]) -> Assignment {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_value_lookup_uses_mixed_radix_order() {
        let dist = Distribution::new(
            vec!["A".into(), "B".into()],
            vec![2, 3],
            vec![0.0, 0.1, 0.2, 0.3, 0.25, 0.15],
        )
        .expect("valid shape");

        assert_eq!(dist.value(&assignment(&[("A", 0), ("B", 2)])).unwrap(), 0.2);
        assert_eq!(
            dist.value(&assignment(&[("A", 1), ("B", 1)])).unwrap(),
            0.25
        );
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let dist = Distribution::new(vec!["A".into()], vec![2], vec![0.4, 0.6]).unwrap();
        let err = dist.value(&assignment(&[("B", 0)])).unwrap_err();
        assert_eq!(err, ModelError::MissingAssignment("A".into()));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = Distribution::new(vec!["A".into()], vec![2], vec![1.0]).unwrap_err();
        assert!(matches!(err, ModelError::TableShape { .. }));
    }
}
