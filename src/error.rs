//! Error types shared by both solvers.
//!
//! Infeasibility is not an error: it is a regular answer carried by the
//! output documents. Errors here abort the run with a non-zero exit.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    /// The input document violated the schema or a value constraint.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The underlying optimizer reported an unrecoverable failure.
    #[error("{phase} failed: {message}")]
    SolverFailure {
        phase: &'static str,
        message: String,
    },
}

pub type SolverResult<T> = Result<T, SolverError>;
