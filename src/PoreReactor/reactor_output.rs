//! Post-processing of a solved model: balance checks, yields and pretty printed tables.
use crate::PoreReactor::discrete_system::PoreVar;
use crate::PoreReactor::reactor_errors::CascadeError;
use crate::PoreReactor::reactor_model::ReactorModel;
use crate::PoreReactor::solver_config::SolverResults;
use log::{info, warn};
use prettytable::{Table, row};

/// Balance checks of the discretized solution
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionQuality {
    /// max |S_pore(0, t) - S_bulk(t)|
    pub entrance_mismatch: f64,
    /// max |L dS/dx(L, t)|
    pub far_end_gradient: f64,
    /// max |S_bulk(0) - S_initial|
    pub initial_condition_error: f64,
    /// max |Σ S_bulk(t) - Σ S_initial| / Σ S_initial
    pub species_sum_drift: f64,
}

impl Default for SolutionQuality {
    fn default() -> Self {
        Self {
            entrance_mismatch: 0.0,
            far_end_gradient: 0.0,
            initial_condition_error: 0.0,
            species_sum_drift: 0.0,
        }
    }
}

impl SolutionQuality {
    pub fn is_within(&self, tol: f64) -> bool {
        self.entrance_mismatch <= tol
            && self.far_end_gradient <= tol
            && self.initial_condition_error <= tol
            && self.species_sum_drift <= tol
    }
}

pub fn check_solution(model: &ReactorModel) -> Result<SolutionQuality, CascadeError> {
    let (system, z) = match (model.system(), model.values()) {
        (Some(system), Some(z)) => (system, z),
        _ => {
            return Err(CascadeError::Discretization(
                "model has not been discretized".to_string(),
            ));
        }
    };
    let l = system.layout;
    let initial = &system.bulk.initial_conditions;
    let mut quality = SolutionQuality::default();
    for c in 0..l.n_species {
        quality.initial_condition_error = quality
            .initial_condition_error
            .max((z[l.bulk(c, 0)] - initial[c]).abs());
        for i in 0..l.n_time_points {
            let entrance = z[l.pore(i, c, PoreVar::Value, 0)];
            quality.entrance_mismatch = quality
                .entrance_mismatch
                .max((entrance - z[l.bulk(c, i)]).abs());
            quality.far_end_gradient = quality
                .far_end_gradient
                .max(z[l.pore(i, c, PoreVar::Gradient, l.n_pore_points - 1)].abs());
        }
    }
    let total0: f64 = initial.iter().sum();
    if total0 > 0.0 {
        for i in 0..l.n_time_points {
            let total: f64 = (0..l.n_species).map(|c| z[l.bulk(c, i)]).sum();
            quality.species_sum_drift = quality
                .species_sum_drift
                .max((total - total0).abs() / total0);
        }
    }
    info!("solution quality: {:?}", quality);
    if !quality.is_within(1e-3) {
        warn!("solution balances are violated: {:?}", quality);
    }
    Ok(quality)
}

/// S_i(t_f) / S_1(0) of every product species
pub fn yields(model: &ReactorModel) -> Result<Vec<(String, f64)>, CascadeError> {
    let species = model.params().species();
    let first = model.bulk_trajectory(&species[0])?;
    let s1_initial = first.first().map(|&(_, s)| s).unwrap_or(0.0);
    if !(s1_initial > 0.0) {
        return Err(CascadeError::InvalidParameter(
            "yield is undefined for a zero initial substrate".to_string(),
        ));
    }
    species[1..]
        .iter()
        .map(|s| Ok((s.clone(), model.final_bulk(s)? / s1_initial)))
        .collect()
}

/// Task summary: geometry, constants and the symbolic balances
pub fn print_task(model: &ReactorModel) {
    let params = model.params();
    let mut table = Table::new();
    table.add_row(row!["Parameter", "Value"]);
    table.add_row(row!["topology", model.topology().to_string()]);
    table.add_row(row!["kinetics", format!("{:?}", params.kinetics())]);
    table.add_row(row!["t_f", format!("{}", params.reaction_time())]);
    table.add_row(row!["L", format!("{:.3e}", params.pore_length())]);
    table.add_row(row!["A", format!("{:.3e}", params.pore_area())]);
    table.add_row(row!["Np", format!("{:.3e}", params.pores_count())]);
    for (i, s) in params.species().iter().enumerate() {
        table.add_row(row![
            format!("{}: S0, D", s),
            format!(
                "{}, {:.3e}",
                params.initial_concentrations()[i],
                params.diffusivity()[i]
            )
        ]);
    }
    for (j, e) in params.enzymes().iter().enumerate() {
        table.add_row(row![
            format!("{}: E_max, k, K_M", e),
            format!(
                "{}, {}, {}",
                params.max_enzyme_density()[j],
                params.reaction_const()[j],
                params.michaelis_const()[j]
            )
        ]);
    }
    table.printstd();

    let mut eq_table = Table::new();
    eq_table.add_row(row!["Balance", "Equation"]);
    let pore = model.pore_balance();
    for (s, eq) in pore.species.iter().zip(pore.equation_exprs()) {
        eq_table.add_row(row![format!("pore {}", s), format!("{} = 0", eq)]);
    }
    let bulk = model.bulk_balance();
    for (s, rate) in bulk.species.iter().zip(bulk.rate_exprs()) {
        eq_table.add_row(row![format!("bulk d{}/dt", s), format!("{}", rate)]);
    }
    eq_table.printstd();
}

/// Bulk concentrations at up to `rows` time points, solver status and yields
pub fn print_results(
    model: &ReactorModel,
    results: &SolverResults,
    rows: usize,
) -> Result<(), CascadeError> {
    let species = model.params().species().to_vec();
    let trajectories = species
        .iter()
        .map(|s| model.bulk_trajectory(s))
        .collect::<Result<Vec<_>, _>>()?;
    let n = trajectories.first().map(|t| t.len()).unwrap_or(0);
    let stride = if rows == 0 { n.max(1) } else { (n / rows).max(1) };

    let mut table = Table::new();
    let mut header = vec!["t".to_string()];
    header.extend(species.iter().cloned());
    table.add_row(header.into());
    let mut indices: Vec<usize> = (0..n).step_by(stride).collect();
    if n > 0 && indices.last() != Some(&(n - 1)) {
        indices.push(n - 1);
    }
    for i in indices {
        let mut cells = vec![format!("{:.2}", trajectories[0][i].0)];
        cells.extend(trajectories.iter().map(|t| format!("{:.5}", t[i].1)));
        table.add_row(cells.into());
    }
    table.printstd();

    let mut status = Table::new();
    status.add_row(row!["termination", results.termination.to_string()]);
    status.add_row(row!["status", results.status.to_string()]);
    status.add_row(row!["attempt", format!("{:?}", results.attempt)]);
    status.add_row(row!["iterations", results.iterations.to_string()]);
    status.add_row(row![
        "constraint violation",
        format!("{:.3e}", results.constraint_violation)
    ]);
    if results.is_optimal() {
        for (s, y) in yields(model)? {
            status.add_row(row![format!("{} yield", s), format!("{:.4}", y)]);
        }
    }
    status.printstd();
    Ok(())
}
