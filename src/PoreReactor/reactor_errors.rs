use thiserror::Error;

/// Failures raised by the nonlinear solver itself (as opposed to a solve that simply
/// terminates without reaching the tolerance).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveFailure {
    #[error("singular Jacobian in block {0}")]
    SingularJacobian(usize),
    #[error("singular Schur complement of the bulk (border) system")]
    SingularBorderSystem,
    #[error("non-finite residual at iteration {0}")]
    NonFiniteResidual(usize),
    #[error("non-finite Newton step at iteration {0}")]
    NonFiniteStep(usize),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// Error taxonomy of the pore cascade model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CascadeError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unsupported enzyme profile shape: {0}")]
    UnsupportedProfile(String),
    #[error("invalid immobilization topology: {0}")]
    InvalidTopology(String),
    #[error("discretization error: {0}")]
    Discretization(String),
    #[error("solver failure: {0}")]
    SolveFailure(#[from] SolveFailure),
}
