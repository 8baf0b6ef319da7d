//! Error types for the discrete causal model.
//!
//! Malformed models (cycles, incompatible or unnormalized tables) fail fast
//! at construction; there is no partial recovery.

use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("dependency graph has a cycle through {node}")]
    CyclicGraph { node: String },

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error(
        "table for {node} lists parent {parent} with cardinality {listed}, \
         but {parent} has cardinality {actual}"
    )]
    ParentCardinalityMismatch {
        node: String,
        parent: String,
        listed: usize,
        actual: usize,
    },

    #[error("table for {node} has {got} entries, expected {expected}")]
    TableShape {
        node: String,
        expected: usize,
        got: usize,
    },

    #[error("table row for {node} sums to {sum}, expected 1")]
    RowNotNormalized { node: String, sum: f64 },

    #[error("table for {node} contains a negative probability")]
    NegativeProbability { node: String },

    #[error("replacement table for {node} changes its parent structure")]
    IncompatibleReplacement { node: String },

    #[error("value {value} is out of range for {node} (cardinality {cardinality})")]
    ValueOutOfRange {
        node: String,
        value: usize,
        cardinality: usize,
    },

    #[error("evidence has zero probability under the model")]
    ZeroProbabilityEvidence,

    #[error("assignment is missing a value for {0}")]
    MissingAssignment(String),
}
