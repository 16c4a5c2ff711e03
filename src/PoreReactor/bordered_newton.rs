//! # Bordered-block damped Newton solver
//!
//! The discretized cascade has a block-bordered Jacobian: one dense block per time point
//! (the pore boundary value problems at that time) and a small border (the bulk states and
//! their time derivatives) coupling all blocks together.
//!
//! ```text
//! | A_0         B_0 | |Δp_0|   |r_0|
//! |     A_1     B_1 | |Δp_1| = |r_1|
//! |         ... ... | | .. |   |...|
//! | C_0 C_1 ... D   | |Δb  |   |r_b|
//! ```
//!
//! The linear system is solved by the Schur complement of the border:
//! `X_i = A_i⁻¹ B_i`, `y_i = A_i⁻¹ r_i`, `(D - Σ C_i X_i) Δb = r_b - Σ C_i y_i`,
//! `Δp_i = y_i - X_i Δb`. `B_i` and `C_i` are stored compactly on the few border columns/rows
//! they touch.
//!
//! Newton iterations are globalized by a regularization shift `μI` on the row-scaled Jacobian
//! and a backtracking line search on `½‖S r‖²`. A point is optimal when `‖S r‖∞ ≤ tol` and
//! `‖r‖∞ ≤ constr_viol_tol · max(1, ‖z‖∞)`.
use crate::PoreReactor::reactor_errors::SolveFailure;
use crate::PoreReactor::solver_config::{
    LinearSolver, MU_MAX, MuStrategy, ScalingMethod, SolverOptions, SolverStatus,
    TerminationCondition,
};
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector, Dyn, FullPivLU, LU};

const ARMIJO: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 20;
const MAX_SCALED_GRADIENT: f64 = 100.0;
const MONOTONE_MU_FACTOR: f64 = 0.2;
const MU_FLOOR: f64 = 1e-8;

/// One diagonal block with its couplings to the border
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianBlock {
    /// ∂(local rows)/∂(local unknowns)
    pub local: DMatrix<f64>,
    /// border unknowns the local rows depend on
    pub coupling_cols: Vec<usize>,
    /// ∂(local rows)/∂(coupling_cols), local.nrows() x coupling_cols.len()
    pub local_to_border: DMatrix<f64>,
    /// border rows depending on the local unknowns
    pub coupling_rows: Vec<usize>,
    /// ∂(coupling_rows)/∂(local unknowns), coupling_rows.len() x local.ncols()
    pub border_to_local: DMatrix<f64>,
}

/// Jacobian with unknowns and rows ordered as `[block_0, block_1, ..., border]`
#[derive(Debug, Clone, PartialEq)]
pub struct BorderedJacobian {
    pub blocks: Vec<JacobianBlock>,
    pub border: DMatrix<f64>,
}

enum Factorization {
    Partial(LU<f64, Dyn, Dyn>),
    Full(FullPivLU<f64, Dyn, Dyn>),
}

impl Factorization {
    fn new(matrix: DMatrix<f64>, solver: LinearSolver) -> Self {
        match solver {
            LinearSolver::DenseLu => Factorization::Partial(matrix.lu()),
            LinearSolver::FullPivLu => Factorization::Full(matrix.full_piv_lu()),
        }
    }

    fn solve(&self, rhs: &DMatrix<f64>) -> Option<DMatrix<f64>> {
        match self {
            Factorization::Partial(lu) => lu.solve(rhs),
            Factorization::Full(lu) => lu.solve(rhs),
        }
    }
}

impl BorderedJacobian {
    pub fn border_size(&self) -> usize {
        self.border.nrows()
    }

    pub fn n_unknowns(&self) -> usize {
        self.blocks.iter().map(|b| b.local.nrows()).sum::<usize>() + self.border_size()
    }

    fn block_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.blocks.len());
        let mut offset = 0;
        for block in &self.blocks {
            offsets.push(offset);
            offset += block.local.nrows();
        }
        offsets
    }

    /// Largest absolute entry of every row
    pub fn row_max_abs(&self) -> DVector<f64> {
        let n = self.n_unknowns();
        let border_offset = n - self.border_size();
        let mut out = DVector::zeros(n);
        for (block, offset) in self.blocks.iter().zip(self.block_offsets()) {
            for r in 0..block.local.nrows() {
                let local = block.local.row(r).amax();
                let coupling = if block.local_to_border.ncols() > 0 {
                    block.local_to_border.row(r).amax()
                } else {
                    0.0
                };
                out[offset + r] = local.max(coupling);
            }
            for (ri, &row) in block.coupling_rows.iter().enumerate() {
                let value = block.border_to_local.row(ri).amax();
                let idx = border_offset + row;
                out[idx] = out[idx].max(value);
            }
        }
        for r in 0..self.border_size() {
            let idx = border_offset + r;
            out[idx] = out[idx].max(self.border.row(r).amax());
        }
        out
    }

    pub fn scale_rows(&mut self, scale: &DVector<f64>) {
        let border_offset = self.n_unknowns() - self.border_size();
        let offsets = self.block_offsets();
        for (block, offset) in self.blocks.iter_mut().zip(offsets) {
            for r in 0..block.local.nrows() {
                let s = scale[offset + r];
                block.local.row_mut(r).scale_mut(s);
                block.local_to_border.row_mut(r).scale_mut(s);
            }
            for (ri, &row) in block.coupling_rows.iter().enumerate() {
                block
                    .border_to_local
                    .row_mut(ri)
                    .scale_mut(scale[border_offset + row]);
            }
        }
        for r in 0..self.border_size() {
            self.border.row_mut(r).scale_mut(scale[border_offset + r]);
        }
    }

    /// Adds `mu` to the whole diagonal
    pub fn add_diagonal(&mut self, mu: f64) {
        for block in self.blocks.iter_mut() {
            for i in 0..block.local.nrows() {
                block.local[(i, i)] += mu;
            }
        }
        for i in 0..self.border_size() {
            self.border[(i, i)] += mu;
        }
    }

    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        let n = self.n_unknowns();
        let nb = self.border_size();
        let border_offset = n - nb;
        let xb = x.rows(border_offset, nb);
        let mut out = DVector::zeros(n);
        out.rows_mut(border_offset, nb)
            .copy_from(&(&self.border * &xb));
        for (block, offset) in self.blocks.iter().zip(self.block_offsets()) {
            let m = block.local.nrows();
            let xl = x.rows(offset, m);
            let coupled = DVector::from_iterator(
                block.coupling_cols.len(),
                block.coupling_cols.iter().map(|&c| xb[c]),
            );
            let local = &block.local * &xl + &block.local_to_border * coupled;
            out.rows_mut(offset, m).copy_from(&local);
            let to_border = &block.border_to_local * &xl;
            for (ri, &row) in block.coupling_rows.iter().enumerate() {
                out[border_offset + row] += to_border[ri];
            }
        }
        out
    }

    /// Assembled dense matrix, for small systems and diagnostics
    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.n_unknowns();
        let nb = self.border_size();
        let border_offset = n - nb;
        let mut dense = DMatrix::zeros(n, n);
        dense
            .view_mut((border_offset, border_offset), (nb, nb))
            .copy_from(&self.border);
        for (block, offset) in self.blocks.iter().zip(self.block_offsets()) {
            let m = block.local.nrows();
            dense.view_mut((offset, offset), (m, m)).copy_from(&block.local);
            for (ci, &col) in block.coupling_cols.iter().enumerate() {
                for r in 0..m {
                    dense[(offset + r, border_offset + col)] = block.local_to_border[(r, ci)];
                }
            }
            for (ri, &row) in block.coupling_rows.iter().enumerate() {
                for c in 0..m {
                    dense[(border_offset + row, offset + c)] = block.border_to_local[(ri, c)];
                }
            }
        }
        dense
    }

    /// Solves `J x = rhs` through the Schur complement of the border
    pub fn solve(
        &self,
        rhs: &DVector<f64>,
        solver: LinearSolver,
    ) -> Result<DVector<f64>, SolveFailure> {
        let n = self.n_unknowns();
        if rhs.len() != n {
            return Err(SolveFailure::DimensionMismatch(format!(
                "right-hand side has {} rows, system has {}",
                rhs.len(),
                n
            )));
        }
        let nb = self.border_size();
        let border_offset = n - nb;
        let offsets = self.block_offsets();

        let mut schur = self.border.clone();
        let mut g = rhs.rows(border_offset, nb).into_owned();
        // per block: [X_i | y_i]
        let mut eliminated = Vec::with_capacity(self.blocks.len());
        for (b, (block, &offset)) in self.blocks.iter().zip(offsets.iter()).enumerate() {
            let m = block.local.nrows();
            let k = block.coupling_cols.len();
            let mut block_rhs = DMatrix::zeros(m, k + 1);
            block_rhs.columns_mut(0, k).copy_from(&block.local_to_border);
            block_rhs.column_mut(k).copy_from(&rhs.rows(offset, m));
            let factor = Factorization::new(block.local.clone(), solver);
            let sol = factor
                .solve(&block_rhs)
                .ok_or(SolveFailure::SingularJacobian(b))?;
            let cs = &block.border_to_local * &sol;
            for (ri, &row) in block.coupling_rows.iter().enumerate() {
                for (ci, &col) in block.coupling_cols.iter().enumerate() {
                    schur[(row, col)] -= cs[(ri, ci)];
                }
                g[row] -= cs[(ri, k)];
            }
            eliminated.push(sol);
        }

        let db = if nb > 0 {
            let g = DMatrix::from_column_slice(nb, 1, g.as_slice());
            let sol = Factorization::new(schur, solver)
                .solve(&g)
                .ok_or(SolveFailure::SingularBorderSystem)?;
            DVector::from_column_slice(sol.as_slice())
        } else {
            DVector::zeros(0)
        };

        let mut x = DVector::zeros(n);
        for ((block, &offset), sol) in self.blocks.iter().zip(offsets.iter()).zip(eliminated) {
            let m = block.local.nrows();
            let k = block.coupling_cols.len();
            let coupled = DVector::from_iterator(k, block.coupling_cols.iter().map(|&c| db[c]));
            let mut dp = sol.column(k).into_owned();
            dp -= sol.columns(0, k) * coupled;
            x.rows_mut(offset, m).copy_from(&dp);
        }
        x.rows_mut(border_offset, nb).copy_from(&db);
        Ok(x)
    }
}

/// Square nonlinear system `F(z) = 0` with a bordered Jacobian
pub trait NonlinearProblem {
    fn n_unknowns(&self) -> usize;
    fn residual(&self, z: &DVector<f64>) -> DVector<f64>;
    fn jacobian(&self, z: &DVector<f64>) -> BorderedJacobian;
    /// unknowns with lower bound 0
    fn bounded_below(&self) -> Vec<usize> {
        Vec::new()
    }
}

/// Result of one solver attempt that ran to termination
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonOutcome {
    pub solution: DVector<f64>,
    pub termination: TerminationCondition,
    pub status: SolverStatus,
    pub iterations: usize,
    pub constraint_violation: f64,
    pub scaled_error: f64,
    pub message: String,
}

/// Seam between the orchestrator and the numerical method
pub trait NonlinearSolver {
    fn solve(
        &mut self,
        problem: &dyn NonlinearProblem,
        initial_guess: &DVector<f64>,
        options: &SolverOptions,
    ) -> Result<NewtonOutcome, SolveFailure>;
}

#[derive(Debug, Clone, Default)]
pub struct BorderedNewton {
    /// ‖residual‖∞ after every iteration of the last solve
    pub residual_history: Vec<f64>,
}

impl BorderedNewton {
    pub fn new() -> Self {
        Self::default()
    }
}

fn scaled(r: &DVector<f64>, s: &DVector<f64>) -> DVector<f64> {
    r.component_mul(s)
}

fn project(z: &mut DVector<f64>, bounded: &[usize], floor: f64) {
    for &i in bounded {
        if z[i] < floor {
            z[i] = floor;
        }
    }
}

fn is_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

impl NonlinearSolver for BorderedNewton {
    fn solve(
        &mut self,
        problem: &dyn NonlinearProblem,
        initial_guess: &DVector<f64>,
        options: &SolverOptions,
    ) -> Result<NewtonOutcome, SolveFailure> {
        let n = problem.n_unknowns();
        if initial_guess.len() != n {
            return Err(SolveFailure::DimensionMismatch(format!(
                "initial guess has {} entries, problem has {} unknowns",
                initial_guess.len(),
                n
            )));
        }
        self.residual_history.clear();
        let bounded = if options.nonnegative_concentrations {
            problem.bounded_below()
        } else {
            Vec::new()
        };
        let relaxed_floor = -options.bound_relax_factor;

        let mut z = initial_guess.clone();
        project(&mut z, &bounded, relaxed_floor);
        let mut r = problem.residual(&z);
        if r.len() != n {
            return Err(SolveFailure::DimensionMismatch(format!(
                "residual has {} rows, problem has {} unknowns",
                r.len(),
                n
            )));
        }
        if !is_finite(&r) {
            return Err(SolveFailure::NonFiniteResidual(0));
        }
        let first_jacobian = problem.jacobian(&z);

        // row scaling is fixed at the starting point
        let scale = match options.scaling {
            ScalingMethod::None => DVector::from_element(n, 1.0),
            ScalingMethod::GradientBased => first_jacobian.row_max_abs().map(|max| {
                if max > MAX_SCALED_GRADIENT {
                    MAX_SCALED_GRADIENT / max
                } else {
                    1.0
                }
            }),
        };

        let mut pending_jacobian = Some(first_jacobian);
        let mut mu = options.mu_init;
        let mut acceptable_count = 0;
        let mut iterations = 0;
        let finish = |z: DVector<f64>,
                      r: &DVector<f64>,
                      termination: TerminationCondition,
                      status: SolverStatus,
                      iterations: usize,
                      message: String| {
            let mut solution = z;
            if options.honor_original_bounds {
                project(&mut solution, &bounded, 0.0);
            }
            NewtonOutcome {
                solution,
                termination,
                status,
                iterations,
                constraint_violation: r.amax(),
                scaled_error: scaled(r, &scale).amax(),
                message,
            }
        };

        while iterations < options.max_iter {
            let error = scaled(&r, &scale).amax();
            let violation = r.amax() / z.amax().max(1.0);
            if error <= options.tol && violation <= options.constr_viol_tol {
                info!("Newton converged in {} iterations, error {:.3e}", iterations, error);
                return Ok(finish(
                    z,
                    &r,
                    TerminationCondition::Optimal,
                    SolverStatus::Ok,
                    iterations,
                    "Optimal Solution Found".to_string(),
                ));
            }
            if error <= options.acceptable_tol {
                acceptable_count += 1;
                if acceptable_count >= options.acceptable_iter {
                    warn!(
                        "Newton stopped at an acceptable point after {} iterations, error {:.3e}",
                        iterations, error
                    );
                    return Ok(finish(
                        z,
                        &r,
                        TerminationCondition::Optimal,
                        SolverStatus::Warning,
                        iterations,
                        "Solved To Acceptable Level".to_string(),
                    ));
                }
            } else {
                acceptable_count = 0;
            }

            iterations += 1;
            let mut shifted = match pending_jacobian.take() {
                Some(jac) => jac,
                None => problem.jacobian(&z),
            };
            shifted.scale_rows(&scale);
            if mu > 0.0 {
                shifted.add_diagonal(mu);
            }
            let sr = scaled(&r, &scale);
            let rhs = -&sr;
            let dz = shifted.solve(&rhs, options.linear_solver)?;
            if !is_finite(&dz) {
                return Err(SolveFailure::NonFiniteStep(iterations));
            }

            let phi0 = 0.5 * sr.norm_squared();
            let mut alpha = 1.0;
            let mut accepted = None;
            for _ in 0..=MAX_BACKTRACKS {
                let mut trial = &z + &dz * alpha;
                project(&mut trial, &bounded, relaxed_floor);
                let r_trial = problem.residual(&trial);
                if is_finite(&r_trial) {
                    let phi = 0.5 * scaled(&r_trial, &scale).norm_squared();
                    if phi <= (1.0 - 2.0 * ARMIJO * alpha) * phi0 {
                        accepted = Some((trial, r_trial));
                        break;
                    }
                }
                alpha *= 0.5;
            }

            match accepted {
                Some((trial, r_trial)) => {
                    z = trial;
                    r = r_trial;
                    mu = match options.mu_strategy {
                        MuStrategy::Adaptive => mu / 10.0,
                        MuStrategy::Monotone => mu * MONOTONE_MU_FACTOR,
                    };
                }
                None => {
                    mu = (mu * 10.0).max(MU_FLOOR);
                    if mu > MU_MAX {
                        warn!(
                            "line search failed at maximum regularization after {} iterations",
                            iterations
                        );
                        return Ok(finish(
                            z,
                            &r,
                            TerminationCondition::Infeasible,
                            SolverStatus::Warning,
                            iterations,
                            "Converged to a point of local infeasibility".to_string(),
                        ));
                    }
                }
            }
            self.residual_history.push(r.amax());
            if options.verbose {
                info!(
                    "iter {:4}  ‖r‖∞ {:.4e}  ‖Sr‖∞ {:.4e}  α {:.2e}  μ {:.1e}",
                    iterations,
                    r.amax(),
                    scaled(&r, &scale).amax(),
                    alpha,
                    mu
                );
            } else {
                debug!(
                    "iter {} residual {:.4e} alpha {:.2e} mu {:.1e}",
                    iterations,
                    r.amax(),
                    alpha,
                    mu
                );
            }
        }

        // the last accepted iterate may already satisfy the tolerance
        let error = scaled(&r, &scale).amax();
        if error <= options.tol && r.amax() / z.amax().max(1.0) <= options.constr_viol_tol {
            return Ok(finish(
                z,
                &r,
                TerminationCondition::Optimal,
                SolverStatus::Ok,
                iterations,
                "Optimal Solution Found".to_string(),
            ));
        }
        warn!(
            "Newton reached the iteration limit {}, error {:.3e}",
            options.max_iter, error
        );
        Ok(finish(
            z,
            &r,
            TerminationCondition::MaxIterations,
            SolverStatus::Warning,
            iterations,
            "Maximum Number of Iterations Exceeded".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two 2x2 blocks and one border unknown:
    /// u_i - a_i w = 0, v_i³ + v_i - u_i = 0, w + 0.1 Σ u_i - 2 = 0
    struct ToyProblem {
        a: [f64; 2],
    }

    impl NonlinearProblem for ToyProblem {
        fn n_unknowns(&self) -> usize {
            5
        }
        fn residual(&self, z: &DVector<f64>) -> DVector<f64> {
            let w = z[4];
            let mut r = DVector::zeros(5);
            for i in 0..2 {
                let (u, v) = (z[2 * i], z[2 * i + 1]);
                r[2 * i] = u - self.a[i] * w;
                r[2 * i + 1] = v * v * v + v - u;
            }
            r[4] = w + 0.1 * (z[0] + z[2]) - 2.0;
            r
        }
        fn jacobian(&self, z: &DVector<f64>) -> BorderedJacobian {
            let blocks = (0..2)
                .map(|i| {
                    let v = z[2 * i + 1];
                    JacobianBlock {
                        local: DMatrix::from_row_slice(2, 2, &[1.0, 0.0, -1.0, 3.0 * v * v + 1.0]),
                        coupling_cols: vec![0],
                        local_to_border: DMatrix::from_row_slice(2, 1, &[-self.a[i], 0.0]),
                        coupling_rows: vec![0],
                        border_to_local: DMatrix::from_row_slice(1, 2, &[0.1, 0.0]),
                    }
                })
                .collect();
            BorderedJacobian {
                blocks,
                border: DMatrix::from_element(1, 1, 1.0),
            }
        }
    }

    struct NoRoot;

    impl NonlinearProblem for NoRoot {
        fn n_unknowns(&self) -> usize {
            1
        }
        fn residual(&self, z: &DVector<f64>) -> DVector<f64> {
            DVector::from_element(1, z[0] * z[0] + 1.0)
        }
        fn jacobian(&self, z: &DVector<f64>) -> BorderedJacobian {
            BorderedJacobian {
                blocks: vec![JacobianBlock {
                    local: DMatrix::from_element(1, 1, 2.0 * z[0]),
                    coupling_cols: vec![],
                    local_to_border: DMatrix::zeros(1, 0),
                    coupling_rows: vec![],
                    border_to_local: DMatrix::zeros(0, 1),
                }],
                border: DMatrix::zeros(0, 0),
            }
        }
    }

    #[test]
    fn test_schur_solve_matches_dense() {
        let problem = ToyProblem { a: [1.0, 2.0] };
        let z = DVector::from_vec(vec![0.3, 0.7, -0.2, 1.1, 0.5]);
        let jac = problem.jacobian(&z);
        let rhs = DVector::from_vec(vec![1.0, -2.0, 0.5, 3.0, -1.0]);
        let dense = jac.to_dense().lu().solve(&rhs).unwrap();
        for solver in [LinearSolver::DenseLu, LinearSolver::FullPivLu] {
            let x = jac.solve(&rhs, solver).unwrap();
            for i in 0..5 {
                assert_relative_eq!(x[i], dense[i], epsilon = 1e-12);
            }
        }
        let back = jac.mul_vec(&dense);
        for i in 0..5 {
            assert_relative_eq!(back[i], rhs[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_row_scaling_and_shift() {
        let problem = ToyProblem { a: [400.0, 2.0] };
        let z = DVector::from_vec(vec![0.0, 0.0, 0.0, 0.0, 1.0]);
        let mut jac = problem.jacobian(&z);
        let maxima = jac.row_max_abs();
        assert_eq!(maxima[0], 400.0);
        assert_eq!(maxima[4], 1.0);
        let scale = maxima.map(|m| if m > 100.0 { 100.0 / m } else { 1.0 });
        jac.scale_rows(&scale);
        assert_relative_eq!(jac.blocks[0].local_to_border[(0, 0)], -100.0);
        jac.add_diagonal(0.5);
        assert_relative_eq!(jac.border[(0, 0)], 1.5);
        assert_relative_eq!(jac.blocks[1].local[(1, 1)], 1.5);
    }

    #[test]
    fn test_newton_converges_on_bordered_problem() {
        let problem = ToyProblem { a: [1.0, 2.0] };
        let mut solver = BorderedNewton::new();
        let options = SolverOptions::primary(100, 1e-10);
        let outcome = solver
            .solve(&problem, &DVector::from_element(5, 0.5), &options)
            .unwrap();
        assert_eq!(outcome.termination, TerminationCondition::Optimal);
        assert_eq!(outcome.status, SolverStatus::Ok);
        let w = 2.0 / 1.3;
        assert_relative_eq!(outcome.solution[4], w, epsilon = 1e-8);
        assert_relative_eq!(outcome.solution[2], 2.0 * w, epsilon = 1e-8);
        let v = outcome.solution[1];
        assert_relative_eq!(v * v * v + v, w, epsilon = 1e-8);
        assert!(!solver.residual_history.is_empty());
    }

    #[test]
    fn test_iteration_cap() {
        let problem = ToyProblem { a: [1.0, 2.0] };
        let mut options = SolverOptions::primary(1, 1e-14);
        options.acceptable_tol = 1e-16;
        let outcome = BorderedNewton::new()
            .solve(&problem, &DVector::from_element(5, 10.0), &options)
            .unwrap();
        assert_eq!(outcome.termination, TerminationCondition::MaxIterations);
        assert_eq!(outcome.iterations, 1);
    }

    #[test]
    fn test_problem_without_root_is_infeasible() {
        let options = SolverOptions::primary(200, 1e-8);
        let outcome = BorderedNewton::new()
            .solve(&NoRoot, &DVector::from_element(1, 1.0), &options)
            .unwrap();
        assert_eq!(outcome.termination, TerminationCondition::Infeasible);
        assert_relative_eq!(outcome.constraint_violation, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_singular_block_is_failure() {
        let mut options = SolverOptions::primary(10, 1e-8);
        options.mu_init = 0.0;
        options.scaling = ScalingMethod::None;
        let err = BorderedNewton::new()
            .solve(&NoRoot, &DVector::from_element(1, 0.0), &options)
            .unwrap_err();
        assert_eq!(err, SolveFailure::SingularJacobian(0));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = BorderedNewton::new()
            .solve(
                &NoRoot,
                &DVector::from_element(3, 0.0),
                &SolverOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SolveFailure::DimensionMismatch(_)));
    }
}
