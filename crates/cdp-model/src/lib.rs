//! Reference discrete causal model for the causal decision planner.
//!
//! This crate provides the bundled implementation of the planner's model
//! boundary: a directed acyclic model over discrete variables with one
//! conditional probability table per variable, exact conditional queries by
//! joint enumeration, and the intervention ("cut incoming edges") operator.
//!
//! The planner core consumes models exclusively through its adapter trait,
//! so any backend with equivalent semantics (variable elimination, approximate
//! sampling, ...) can stand in for this one.

pub mod distribution;
pub mod error;
pub mod model;
pub mod random;
pub mod table;

pub use distribution::{Assignment, Distribution};
pub use error::{ModelError, Result};
pub use model::DiscreteCausalModel;
pub use random::{random_table, randomize_tables};
pub use table::ConditionalTable;
