//! Error types for integrator setup.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Integration failed with status {status}")]
    Failed { status: crate::SolverStatus },
}

pub type SolverResult<T> = Result<T, SolverError>;
