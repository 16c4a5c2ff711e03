//! # Solver Configuration Module
//!
//! Configuration and result structures of the nonlinear solve.
//!
//! ## Main Structures
//!
//! - **`SolverOptions`**: full option set of one solver attempt (tolerances, regularization
//!   strategy, scaling, bounds handling, linear algebra backend)
//!   - `SolverOptions::primary()` robust settings of the first attempt
//!   - `SolverOptions::relaxed()` derived settings of the single retry
//! - **`SolveSettings`**: what the caller chooses (iteration cap, tolerance, mesh, verbosity),
//!   expands to `SolverOptions`
//! - **`SolverResults`**: termination condition, status, iteration count, final errors and
//!   which attempt produced them
//!
//! ## Interesting Code Features
//!
//! ### Pure retry derivation
//! `relaxed()` takes the primary options by reference and returns a new value, so the retry
//! policy can be tested without running any solve.
//!
//! ### Termination as data
//! Non-optimal terminations are not errors. `TerminationCondition` and `SolverStatus` are
//! plain enums inspected by the caller; only `SolveFailure` (singular or non-finite linear
//! algebra) travels through `Result`.
use crate::PoreReactor::collocation::MeshConfig;
use crate::PoreReactor::reactor_errors::CascadeError;
use std::fmt;

/// Upper bound of the regularization shift before a solve is declared infeasible
pub const MU_MAX: f64 = 1e6;

/// How the regularization shift evolves between iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuStrategy {
    /// decrease x10 after an accepted step, increase x10 after a failed line search
    Adaptive,
    /// decrease by a constant factor after every accepted step
    Monotone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingMethod {
    None,
    /// rows scaled so that the largest Jacobian entry at the starting point is at most 100
    GradientBased,
}

/// Dense factorization used for the diagonal blocks and the Schur complement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearSolver {
    /// LU with partial pivoting
    DenseLu,
    /// LU with full pivoting, slower, more robust on nearly singular blocks
    FullPivLu,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    pub max_iter: usize,
    pub tol: f64,
    pub constr_viol_tol: f64,
    pub acceptable_tol: f64,
    pub acceptable_iter: usize,
    pub mu_strategy: MuStrategy,
    pub mu_init: f64,
    pub bound_relax_factor: f64,
    pub honor_original_bounds: bool,
    pub scaling: ScalingMethod,
    pub linear_solver: LinearSolver,
    /// lower bound 0 on every concentration variable
    pub nonnegative_concentrations: bool,
    pub verbose: bool,
}

impl SolverOptions {
    /// Settings of the first attempt
    pub fn primary(max_iter: usize, tol: f64) -> Self {
        Self {
            max_iter,
            tol,
            constr_viol_tol: tol,
            acceptable_tol: 1e-4,
            acceptable_iter: 5,
            mu_strategy: MuStrategy::Adaptive,
            mu_init: 1e-5,
            bound_relax_factor: 1e-8,
            honor_original_bounds: false,
            scaling: ScalingMethod::GradientBased,
            linear_solver: LinearSolver::DenseLu,
            nonnegative_concentrations: false,
            verbose: false,
        }
    }

    /// Settings of the retry: larger iteration cap, looser tolerance, larger initial
    /// regularization and bound relaxation. Everything else is kept.
    pub fn relaxed(&self) -> Self {
        Self {
            max_iter: 5000,
            tol: 1e-4,
            mu_init: 1e-3,
            bound_relax_factor: 1e-6,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), CascadeError> {
        if self.max_iter == 0 {
            return Err(CascadeError::InvalidParameter(
                "max_iter must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("tol", self.tol),
            ("constr_viol_tol", self.constr_viol_tol),
            ("acceptable_tol", self.acceptable_tol),
        ] {
            if !(value > 0.0) {
                return Err(CascadeError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.mu_init >= 0.0) || !(self.bound_relax_factor >= 0.0) {
            return Err(CascadeError::InvalidParameter(
                "mu_init and bound_relax_factor must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self::primary(5000, 1e-6)
    }
}

/// Caller-facing solve settings
#[derive(Debug, Clone, PartialEq)]
pub struct SolveSettings {
    pub max_iter: usize,
    pub tol: f64,
    /// tolerance on the unscaled residual, `tol` unless set
    pub constr_viol_tol: f64,
    pub verbose: bool,
    pub linear_solver: LinearSolver,
    pub nonnegative_concentrations: bool,
    /// used when the model has not been discretized yet
    pub mesh: MeshConfig,
}

impl Default for SolveSettings {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            tol: 1e-6,
            constr_viol_tol: 1e-6,
            verbose: false,
            linear_solver: LinearSolver::DenseLu,
            nonnegative_concentrations: false,
            mesh: MeshConfig::default(),
        }
    }
}

impl SolveSettings {
    pub fn new(max_iter: usize, tol: f64) -> Self {
        Self {
            max_iter,
            tol,
            constr_viol_tol: tol,
            ..Self::default()
        }
    }

    pub fn with_constr_viol_tol(mut self, constr_viol_tol: f64) -> Self {
        self.constr_viol_tol = constr_viol_tol;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshConfig) -> Self {
        self.mesh = mesh;
        self
    }

    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            constr_viol_tol: self.constr_viol_tol,
            linear_solver: self.linear_solver,
            nonnegative_concentrations: self.nonnegative_concentrations,
            verbose: self.verbose,
            ..SolverOptions::primary(self.max_iter, self.tol)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCondition {
    Optimal,
    Infeasible,
    MaxIterations,
    Error,
}

impl fmt::Display for TerminationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationCondition::Optimal => "optimal",
            TerminationCondition::Infeasible => "infeasible",
            TerminationCondition::MaxIterations => "maxIterations",
            TerminationCondition::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Ok,
    Warning,
    Error,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolverStatus::Ok => "ok",
            SolverStatus::Warning => "warning",
            SolverStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Stage of the robust solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveAttempt {
    Primary,
    Relaxed,
    /// both attempts failed, the failure is reported as data
    Reported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverResults {
    pub termination: TerminationCondition,
    pub status: SolverStatus,
    pub iterations: usize,
    /// ‖residual‖∞ at the returned point
    pub constraint_violation: f64,
    /// ‖scaled residual‖∞ at the returned point
    pub scaled_error: f64,
    pub attempt: SolveAttempt,
    pub message: String,
}

impl SolverResults {
    pub fn is_optimal(&self) -> bool {
        self.termination == TerminationCondition::Optimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_options() {
        let options = SolverOptions::primary(3000, 1e-6);
        assert_eq!(options.constr_viol_tol, 1e-6);
        assert_eq!(options.acceptable_tol, 1e-4);
        assert_eq!(options.acceptable_iter, 5);
        assert_eq!(options.mu_strategy, MuStrategy::Adaptive);
        assert_eq!(options.mu_init, 1e-5);
        assert_eq!(options.bound_relax_factor, 1e-8);
        assert!(!options.honor_original_bounds);
        assert_eq!(options.scaling, ScalingMethod::GradientBased);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_relaxed_is_pure() {
        let mut primary = SolverOptions::primary(100, 1e-8);
        primary.linear_solver = LinearSolver::FullPivLu;
        let relaxed = primary.relaxed();
        assert_eq!(relaxed.max_iter, 5000);
        assert_eq!(relaxed.tol, 1e-4);
        assert_eq!(relaxed.mu_init, 1e-3);
        assert_eq!(relaxed.bound_relax_factor, 1e-6);
        // untouched options survive, the primary is unchanged
        assert_eq!(relaxed.linear_solver, LinearSolver::FullPivLu);
        assert_eq!(relaxed.acceptable_tol, 1e-4);
        assert_eq!(primary.max_iter, 100);
        assert_eq!(primary.mu_init, 1e-5);
    }

    #[test]
    fn test_settings_expand_to_options() {
        let settings = SolveSettings {
            verbose: true,
            ..SolveSettings::new(1000, 1e-4)
        };
        let options = settings.solver_options();
        assert_eq!(options.max_iter, 1000);
        assert_eq!(options.tol, 1e-4);
        assert_eq!(options.constr_viol_tol, 1e-4);
        assert!(options.verbose);

        let settings = SolveSettings::new(1000, 1e-6).with_constr_viol_tol(1e-8);
        let options = settings.solver_options();
        assert_eq!(options.tol, 1e-6);
        assert_eq!(options.constr_viol_tol, 1e-8);
        // the retry loosens tol but keeps the violation tolerance
        assert_eq!(options.relaxed().constr_viol_tol, 1e-8);

        let bad = SolveSettings::new(1000, 1e-6).with_constr_viol_tol(0.0);
        assert!(matches!(
            bad.solver_options().validate(),
            Err(CascadeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_invalid_options() {
        let mut options = SolverOptions::default();
        options.tol = 0.0;
        assert!(options.validate().is_err());
        let mut options = SolverOptions::default();
        options.max_iter = 0;
        assert!(options.validate().is_err());
    }
}
