//! Planner error types.

use cdp_model::ModelError;
use thiserror::Error;

/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("utility function references unknown node {0}")]
    UnknownUtilityNode(String),

    #[error("action catalog references unknown node {0}")]
    UnknownActionNode(String),

    #[error("intervention sets {node} to {value}, out of range for cardinality {cardinality}")]
    InterventionOutOfRange {
        node: String,
        value: usize,
        cardinality: usize,
    },

    #[error("no cached search result for {context}; run a search from the same root first")]
    MissingSearchResult { context: String },

    #[error("no cached branch table for {action}")]
    MissingBranchTable { action: String },
}
