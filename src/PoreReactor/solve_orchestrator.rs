//! # Discretization & Solve Orchestrator
//!
//! Moves a model through `Built -> Discretized -> Solved(termination)`.
//!
//! The robust solve runs the primary solver settings first. A `SolveFailure` raised by the
//! solver (singular or non-finite linear algebra) triggers exactly one retry with
//! `SolverOptions::relaxed`. A second failure is reported as termination `Error` instead of
//! being raised. Non-optimal terminations of either attempt are returned as they are.
use crate::PoreReactor::bordered_newton::{BorderedNewton, NonlinearSolver};
use crate::PoreReactor::collocation::MeshConfig;
use crate::PoreReactor::discrete_system::CascadeSystem;
use crate::PoreReactor::reactor_errors::{CascadeError, SolveFailure};
use crate::PoreReactor::reactor_model::{ModelState, ReactorModel};
use crate::PoreReactor::solver_config::{
    SolveAttempt, SolveSettings, SolverResults, SolverStatus, TerminationCondition,
};
use log::{error, info, warn};

/// Converts both continuous domains into collocation meshes. Allowed only once per model.
pub fn discretize(model: &mut ReactorModel, mesh: &MeshConfig) -> Result<(), CascadeError> {
    if model.state != ModelState::Built {
        return Err(CascadeError::Discretization(format!(
            "only a built model can be discretized, model is {:?}",
            model.state
        )));
    }
    info!(
        "Discretizing model: time {} elements x {} points, pore {} elements x {} points",
        mesh.time_elements, mesh.time_points, mesh.space_elements, mesh.space_points
    );
    let system = CascadeSystem::new(
        &model.params,
        model.pore.clone(),
        model.bulk.clone(),
        mesh,
        model.profile_config.equalize_pore_count,
    )?;
    info!(
        "Discretization completed: {} unknowns, {} time points, {} pore points, effective pore count {:.4e}",
        system.layout.n_unknowns(),
        system.layout.n_time_points,
        system.layout.n_pore_points,
        system.effective_pores_count
    );
    model.values = Some(system.initial_guess());
    model.system = Some(system);
    model.state = ModelState::Discretized;
    Ok(())
}

/// Discretizes (default mesh of `settings` if still `Built`) and solves with the
/// bordered Newton method, retrying once with relaxed settings.
pub fn solve_model_robust(
    model: ReactorModel,
    settings: &SolveSettings,
) -> Result<(ReactorModel, SolverResults), CascadeError> {
    let mut solver = BorderedNewton::new();
    solve_model_robust_with(model, settings, &mut solver)
}

/// Same as [`solve_model_robust`] with a caller-provided solver.
/// Errors are limited to discretization and invalid settings; solver failures are data.
pub fn solve_model_robust_with(
    mut model: ReactorModel,
    settings: &SolveSettings,
    solver: &mut dyn NonlinearSolver,
) -> Result<(ReactorModel, SolverResults), CascadeError> {
    if model.state == ModelState::Built {
        discretize(&mut model, &settings.mesh)?;
    }
    let primary = settings.solver_options();
    primary.validate()?;

    let (system, guess) = match (model.system.take(), model.values.clone()) {
        (Some(system), Some(guess)) => (system, guess),
        _ => {
            return Err(CascadeError::Discretization(
                "model has no discretized system".to_string(),
            ));
        }
    };

    let mut attempt = SolveAttempt::Primary;
    let mut options = primary.clone();
    let mut last_failure: Option<SolveFailure> = None;
    let results = loop {
        match attempt {
            SolveAttempt::Primary | SolveAttempt::Relaxed => {
                info!(
                    "Solving model ({:?} attempt): max_iter {}, tol {:e}, mu_init {:e}",
                    attempt, options.max_iter, options.tol, options.mu_init
                );
                match solver.solve(&system, &guess, &options) {
                    Ok(outcome) => {
                        model.values = Some(outcome.solution);
                        break SolverResults {
                            termination: outcome.termination,
                            status: outcome.status,
                            iterations: outcome.iterations,
                            constraint_violation: outcome.constraint_violation,
                            scaled_error: outcome.scaled_error,
                            attempt,
                            message: outcome.message,
                        };
                    }
                    Err(failure) if attempt == SolveAttempt::Primary => {
                        warn!("First solve attempt failed: {}", failure);
                        warn!("Retrying with more relaxed settings...");
                        options = primary.relaxed();
                        attempt = SolveAttempt::Relaxed;
                        last_failure = Some(failure);
                    }
                    Err(failure) => {
                        error!("Relaxed solve attempt failed: {}", failure);
                        attempt = SolveAttempt::Reported;
                        last_failure = Some(failure);
                    }
                }
            }
            SolveAttempt::Reported => {
                let message = last_failure
                    .as_ref()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "solver failed".to_string());
                break SolverResults {
                    termination: TerminationCondition::Error,
                    status: SolverStatus::Error,
                    iterations: 0,
                    constraint_violation: f64::NAN,
                    scaled_error: f64::NAN,
                    attempt,
                    message,
                };
            }
        }
    };

    model.system = Some(system);
    model.state = ModelState::Solved(results.termination);
    info!("Solver termination condition: {}", results.termination);
    info!("Solver status: {}", results.status);
    if results.termination != TerminationCondition::Optimal {
        warn!("model not solved to optimality: {}", results.message);
    }
    Ok((model, results))
}
