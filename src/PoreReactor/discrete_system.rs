//! # Discretized cascade system
//!
//! Residuals and bordered Jacobian of the collocated two-scale model in dimensionless
//! coordinates `ξ = x/L`, `τ = t/t_f`.
//!
//! Unknowns are ordered `[block_0, ..., block_{Nt-1}, border]`:
//! * block `i` (time point `i`): for every species `c` the pore values `S`, gradients `S_ξ` and
//!   curvatures `S_ξξ` at all `Nx` pore points, `3·Nc·Nx` unknowns;
//! * border: bulk concentrations `S0(c, i)` followed by their time derivatives `S0_τ(c, i)`.
//!
//! Rows of block `i`, species `c` (row index = paired unknown index):
//! * value rows: `S(0) - S0(c, i)` at `j = 0`, collocation `h S_ξ - Σ D S` at `j ≥ 1`
//! * gradient rows: collocation `h S_ξξ - Σ D S_ξ` at point `j+1`, `S_ξ(1)` at `j = Nx-1`
//! * curvature rows: `S_ξξ - L²/D_c · Σ σ E decay r(S)`
//!
//! Border rows: `S0(c, 0) - S_init` or the time collocation `h S0_τ - Σ D S0` for `S0(c, i)`,
//! and the bulk balance `S0_τ - t_f · Σ σ flux` for `S0_τ(c, i)`.
use crate::PoreReactor::bordered_newton::{BorderedJacobian, JacobianBlock, NonlinearProblem};
use crate::PoreReactor::bulk_scale::{BulkBalance, FluxCoupling};
use crate::PoreReactor::collocation::{CollocationMesh, MeshConfig};
use crate::PoreReactor::reactor_errors::CascadeError;
use crate::PoreReactor::reactor_params::ReactorParams;
use crate::PoreReactor::pore_scale::PoreBalance;
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoreVar {
    Value = 0,
    Gradient = 1,
    Curvature = 2,
}

/// Index arithmetic of the unknown vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    pub n_species: usize,
    pub n_pore_points: usize,
    pub n_time_points: usize,
}

impl VariableLayout {
    pub fn block_size(&self) -> usize {
        3 * self.n_species * self.n_pore_points
    }
    pub fn border_size(&self) -> usize {
        2 * self.n_species * self.n_time_points
    }
    pub fn border_offset(&self) -> usize {
        self.n_time_points * self.block_size()
    }
    pub fn n_unknowns(&self) -> usize {
        self.border_offset() + self.border_size()
    }
    /// index of a pore unknown inside its time block
    pub fn local(&self, species: usize, var: PoreVar, point: usize) -> usize {
        (3 * species + var as usize) * self.n_pore_points + point
    }
    pub fn pore(&self, time: usize, species: usize, var: PoreVar, point: usize) -> usize {
        time * self.block_size() + self.local(species, var, point)
    }
    /// index of S0(c, i) inside the border
    pub fn bulk_border(&self, species: usize, time: usize) -> usize {
        species * self.n_time_points + time
    }
    /// index of S0_τ(c, i) inside the border
    pub fn bulk_rate_border(&self, species: usize, time: usize) -> usize {
        (self.n_species + species) * self.n_time_points + time
    }
    pub fn bulk(&self, species: usize, time: usize) -> usize {
        self.border_offset() + self.bulk_border(species, time)
    }
    pub fn bulk_rate(&self, species: usize, time: usize) -> usize {
        self.border_offset() + self.bulk_rate_border(species, time)
    }
}

#[derive(Debug, Clone)]
pub struct CascadeSystem {
    pub layout: VariableLayout,
    pub time_mesh: CollocationMesh,
    pub pore_mesh: CollocationMesh,
    pub pore: PoreBalance,
    pub bulk: BulkBalance,
    pub flux: FluxCoupling,
    pub reaction_time: f64,
    pub pore_length: f64,
    pub effective_pores_count: f64,
    /// E_j at every pore point, [enzyme][point]
    pub enzyme_values: Vec<Vec<f64>>,
    /// decay_j at every time point, [enzyme][point]
    pub decay_values: Vec<Vec<f64>>,
    /// physical time points
    pub time_points: Vec<f64>,
    /// physical pore points
    pub pore_points: Vec<f64>,
}

impl CascadeSystem {
    /// Discretizes both domains and evaluates every profile on the resulting points.
    /// The equalized pore count is computed on the same pore points.
    pub fn new(
        params: &ReactorParams,
        pore: PoreBalance,
        bulk: BulkBalance,
        mesh: &MeshConfig,
        equalize_pore_count: bool,
    ) -> Result<Self, CascadeError> {
        mesh.validate()?;
        let time_domain = params.time_domain();
        let pore_domain = params.pore_domain();
        if !(time_domain.length() > 0.0) || !(pore_domain.length() > 0.0) {
            return Err(CascadeError::Discretization(format!(
                "domains must have positive length, got time {} pore {}",
                time_domain.length(),
                pore_domain.length()
            )));
        }
        let time_mesh = mesh.time_mesh()?;
        let pore_mesh = mesh.space_mesh()?;
        let time_points = time_mesh.scaled_points(&time_domain);
        let pore_points = pore_mesh.scaled_points(&pore_domain);

        let enzyme_values: Vec<Vec<f64>> = pore
            .profiles
            .iter()
            .map(|p| p.evaluate(&pore_points))
            .collect();
        let decay_values: Vec<Vec<f64>> =
            pore.decay.iter().map(|d| d.evaluate(&time_points)).collect();
        let effective_pores_count =
            pore.effective_pores_count(params.pores_count(), &pore_points, equalize_pore_count);
        let flux = FluxCoupling::new(params.diffusivity(), params.pore_area(), effective_pores_count);

        let layout = VariableLayout {
            n_species: params.n_species(),
            n_pore_points: pore_mesh.n_points(),
            n_time_points: time_mesh.n_points(),
        };
        Ok(Self {
            layout,
            time_mesh,
            pore_mesh,
            pore,
            bulk,
            flux,
            reaction_time: time_domain.length(),
            pore_length: pore_domain.length(),
            effective_pores_count,
            enzyme_values,
            decay_values,
            time_points,
            pore_points,
        })
    }

    /// Initial concentrations everywhere, derivatives zero
    pub fn initial_guess(&self) -> DVector<f64> {
        let l = self.layout;
        let mut z = DVector::zeros(l.n_unknowns());
        for c in 0..l.n_species {
            let s0 = self.bulk.initial_conditions[c];
            for i in 0..l.n_time_points {
                for j in 0..l.n_pore_points {
                    z[l.pore(i, c, PoreVar::Value, j)] = s0;
                }
                z[l.bulk(c, i)] = s0;
            }
        }
        z
    }

    /// L²/D_c
    fn reaction_scale(&self, species: usize) -> f64 {
        self.pore_length * self.pore_length / self.pore.diffusivity[species]
    }

    fn slice<'a>(&self, z: &'a DVector<f64>, time: usize, species: usize, var: PoreVar) -> &'a [f64] {
        let start = self.layout.pore(time, species, var, 0);
        &z.as_slice()[start..start + self.layout.n_pore_points]
    }

    fn concentrations_at(&self, z: &DVector<f64>, time: usize, point: usize) -> Vec<f64> {
        (0..self.layout.n_species)
            .map(|c| z[self.layout.pore(time, c, PoreVar::Value, point)])
            .collect()
    }

    fn enzymes_at(&self, point: usize) -> Vec<f64> {
        self.enzyme_values.iter().map(|e| e[point]).collect()
    }

    fn decay_at(&self, time: usize) -> Vec<f64> {
        self.decay_values.iter().map(|d| d[time]).collect()
    }

    /// Entrance flux of `species` at time point `time`
    pub fn flux_at(&self, z: &DVector<f64>, species: usize, time: usize) -> f64 {
        let grad = z[self.layout.pore(time, species, PoreVar::Gradient, 0)] / self.pore_length;
        self.flux.flux(species, grad)
    }

    /// Physical pore gradient dS/dx
    pub fn pore_gradient(&self, z: &DVector<f64>, species: usize, time: usize, point: usize) -> f64 {
        z[self.layout.pore(time, species, PoreVar::Gradient, point)] / self.pore_length
    }

    fn n_fluxes(&self) -> usize {
        self.layout.n_species - 1
    }
}

impl NonlinearProblem for CascadeSystem {
    fn n_unknowns(&self) -> usize {
        self.layout.n_unknowns()
    }

    fn residual(&self, z: &DVector<f64>) -> DVector<f64> {
        let l = self.layout;
        let nx = l.n_pore_points;
        let mut r = DVector::zeros(l.n_unknowns());
        for i in 0..l.n_time_points {
            let decay = self.decay_at(i);
            for c in 0..l.n_species {
                let s = self.slice(z, i, c, PoreVar::Value);
                let ds = self.slice(z, i, c, PoreVar::Gradient);
                let d2s = self.slice(z, i, c, PoreVar::Curvature);
                // value rows
                r[l.pore(i, c, PoreVar::Value, 0)] = s[0] - z[l.bulk(c, i)];
                for q in 1..nx {
                    r[l.pore(i, c, PoreVar::Value, q)] = self.pore_mesh.collocation_residual(q, s, ds);
                }
                // gradient rows
                for q in 1..nx {
                    r[l.pore(i, c, PoreVar::Gradient, q - 1)] =
                        self.pore_mesh.collocation_residual(q, ds, d2s);
                }
                r[l.pore(i, c, PoreVar::Gradient, nx - 1)] = ds[nx - 1];
                // governing equation
                let scale = self.reaction_scale(c);
                for j in 0..nx {
                    let (consumption, _) = self.pore.net_consumption(
                        c,
                        &self.concentrations_at(z, i, j),
                        &self.enzymes_at(j),
                        &decay,
                    );
                    r[l.pore(i, c, PoreVar::Curvature, j)] = d2s[j] - scale * consumption;
                }
            }
        }

        let nt = l.n_time_points;
        for c in 0..l.n_species {
            let s0: Vec<f64> = (0..nt).map(|i| z[l.bulk(c, i)]).collect();
            let ds0: Vec<f64> = (0..nt).map(|i| z[l.bulk_rate(c, i)]).collect();
            r[l.bulk(c, 0)] = s0[0] - self.bulk.initial_conditions[c];
            for q in 1..nt {
                r[l.bulk(c, q)] = self.time_mesh.collocation_residual(q, &s0, &ds0);
            }
            for i in 0..nt {
                let fluxes: Vec<f64> = (0..self.n_fluxes()).map(|f| self.flux_at(z, f, i)).collect();
                let rate: f64 = self.bulk.stoichiometry[c]
                    .iter()
                    .map(|&(f, sign)| sign * fluxes[f])
                    .sum();
                r[l.bulk_rate(c, i)] = ds0[i] - self.reaction_time * rate;
            }
        }
        r
    }

    fn jacobian(&self, z: &DVector<f64>) -> BorderedJacobian {
        let l = self.layout;
        let nx = l.n_pore_points;
        let nt = l.n_time_points;
        let nc = l.n_species;
        let m = l.block_size();
        let h = self.pore_mesh.h;
        let dm = &self.pore_mesh.derivative;
        let ncp = self.pore_mesh.ncp;

        let mut blocks = Vec::with_capacity(nt);
        for i in 0..nt {
            let decay = self.decay_at(i);
            let mut local = DMatrix::zeros(m, m);
            let mut local_to_border = DMatrix::zeros(m, nc);
            let mut border_to_local = DMatrix::zeros(nc, m);
            for c in 0..nc {
                let value = |j| l.local(c, PoreVar::Value, j);
                let gradient = |j| l.local(c, PoreVar::Gradient, j);
                let curvature = |j| l.local(c, PoreVar::Curvature, j);
                // entrance
                local[(value(0), value(0))] = 1.0;
                local_to_border[(value(0), c)] = -1.0;
                // collocation
                for q in 1..nx {
                    let (start, k) = self.pore_mesh.collocation_point(q);
                    local[(value(q), gradient(q))] += h;
                    local[(gradient(q - 1), curvature(q))] += h;
                    for jj in 0..=ncp {
                        local[(value(q), value(start + jj))] -= dm[(k - 1, jj)];
                        local[(gradient(q - 1), gradient(start + jj))] -= dm[(k - 1, jj)];
                    }
                }
                // far end
                local[(gradient(nx - 1), gradient(nx - 1))] = 1.0;
                // governing equation
                let scale = self.reaction_scale(c);
                for j in 0..nx {
                    local[(curvature(j), curvature(j))] = 1.0;
                    let (_, gradient_s) = self.pore.net_consumption(
                        c,
                        &self.concentrations_at(z, i, j),
                        &self.enzymes_at(j),
                        &decay,
                    );
                    for (sub, g) in gradient_s {
                        local[(curvature(j), l.local(sub, PoreVar::Value, j))] -= scale * g;
                    }
                }
                // bulk balance of species c depends on the entrance gradients
                for &(f, sign) in &self.bulk.stoichiometry[c] {
                    // d(-t_f σ flux_f)/dS_ξ = t_f σ coef_f / L
                    border_to_local[(c, l.local(f, PoreVar::Gradient, 0))] +=
                        self.reaction_time * sign * self.flux.coefficients[f] / self.pore_length;
                }
            }
            blocks.push(JacobianBlock {
                local,
                coupling_cols: (0..nc).map(|c| l.bulk_border(c, i)).collect(),
                local_to_border,
                coupling_rows: (0..nc).map(|c| l.bulk_rate_border(c, i)).collect(),
                border_to_local,
            });
        }

        let nb = l.border_size();
        let mut border = DMatrix::zeros(nb, nb);
        let ht = self.time_mesh.h;
        let dt = &self.time_mesh.derivative;
        for c in 0..nc {
            border[(l.bulk_border(c, 0), l.bulk_border(c, 0))] = 1.0;
            for q in 1..nt {
                let (start, k) = self.time_mesh.collocation_point(q);
                let row = l.bulk_border(c, q);
                border[(row, l.bulk_rate_border(c, q))] += ht;
                for jj in 0..=self.time_mesh.ncp {
                    border[(row, l.bulk_border(c, start + jj))] -= dt[(k - 1, jj)];
                }
            }
            for i in 0..nt {
                border[(l.bulk_rate_border(c, i), l.bulk_rate_border(c, i))] = 1.0;
            }
        }
        BorderedJacobian { blocks, border }
    }

    fn bounded_below(&self) -> Vec<usize> {
        let l = self.layout;
        let mut indices = Vec::with_capacity(l.n_species * l.n_time_points * (l.n_pore_points + 1));
        for c in 0..l.n_species {
            for i in 0..l.n_time_points {
                for j in 0..l.n_pore_points {
                    indices.push(l.pore(i, c, PoreVar::Value, j));
                }
                indices.push(l.bulk(c, i));
            }
        }
        indices
    }
}
