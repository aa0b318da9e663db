//! Core error and result types.
//!
//! - `Error`: configuration and schema loading failures
//! - `GenerationError`: completion service failures
//! - `ExecutionError`: store failures, reported as data
//! - `GuardViolation`: SQL refused before execution
//! - `Result`: convenient result type alias

pub mod error;
pub mod result;

pub use error::{Error, ExecutionError, GenerationError, GuardViolation};
pub use result::Result;
