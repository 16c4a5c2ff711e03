//! # Bulk-Scale Constraint Builder
//!
//! Batch reactor mass balances of the linear cascade `S_1 -> S_2 -> ... -> S_N`, driven only
//! by the pore entrance fluxes:
//!
//! ```text
//! dS_1/dt = -flux_1
//! dS_i/dt =  flux_{i-1} - flux_i
//! dS_N/dt =  flux_{N-1}
//! flux_i  = -D_i · dS_i/dx(0, t) · A · N_eff
//! ```
use crate::PoreReactor::reactor_params::ReactorParams;
use RustedSciThe::symbolic::symbolic_engine::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct BulkBalance {
    pub species: Vec<String>,
    /// stoichiometry[i] lists (flux index, sign) entering dS_i/dt
    pub stoichiometry: Vec<Vec<(usize, f64)>>,
    pub initial_conditions: Vec<f64>,
}

pub fn build_bulk_balance(params: &ReactorParams) -> BulkBalance {
    let n = params.n_species();
    let stoichiometry = (0..n)
        .map(|i| {
            let mut entries = Vec::with_capacity(2);
            if i > 0 {
                entries.push((i - 1, 1.0));
            }
            if i + 1 < n {
                entries.push((i, -1.0));
            }
            entries
        })
        .collect();
    BulkBalance {
        species: params.species().to_vec(),
        stoichiometry,
        initial_conditions: params.initial_concentrations().to_vec(),
    }
}

impl BulkBalance {
    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    /// dS_i/dt for the given entrance fluxes (one per consumed species)
    pub fn net_rate(&self, fluxes: &[f64]) -> Vec<f64> {
        self.stoichiometry
            .iter()
            .map(|entries| {
                entries
                    .iter()
                    .map(|&(flux, sign)| sign * fluxes[flux])
                    .sum()
            })
            .collect()
    }

    /// Symbolic right-hand sides in terms of `flux_<species>` variables
    pub fn rate_exprs(&self) -> Vec<Expr> {
        self.stoichiometry
            .iter()
            .map(|entries| {
                entries
                    .iter()
                    .fold(Expr::Const(0.0), |acc, &(flux, sign)| {
                        acc + Expr::Const(sign) * Expr::Var(format!("flux_{}", self.species[flux]))
                    })
            })
            .collect()
    }
}

/// Converts entrance gradients into fluxes: `flux_i = -D_i · A · N_eff · dS_i/dx(0)`
#[derive(Debug, Clone, PartialEq)]
pub struct FluxCoupling {
    /// D_i · A · N_eff per species
    pub coefficients: Vec<f64>,
}

impl FluxCoupling {
    pub fn new(diffusivity: &[f64], pore_area: f64, effective_pores_count: f64) -> Self {
        Self {
            coefficients: diffusivity
                .iter()
                .map(|d| d * pore_area * effective_pores_count)
                .collect(),
        }
    }

    pub fn flux(&self, species: usize, entrance_gradient: f64) -> f64 {
        -self.coefficients[species] * entrance_gradient
    }
}
