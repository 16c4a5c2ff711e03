//! # Pore-Scale Constraint Builder
//!
//! Quasi-steady reaction-diffusion balance of every species inside a pore of length `L`,
//! one boundary value problem per time point:
//!
//! ```text
//! D_i d²S_i/dx² = Σ_terms σ · E_j(x) · decay_j(t) · r_j(S_sub)
//! S_i(0, t)       = S_i,bulk(t)          (entrance)
//! dS_i/dx (L, t)  = 0                    (closed far end)
//! ```
//!
//! `σ = +1` for a consumption (sink) term and `σ = -1` for a production (source) term.
//! The immobilization topology decides which terms exist and which enzyme density applies.
use crate::PoreReactor::enzyme_profile::{DecayFactor, EnzymeProfile, pore_count_coefficient};
use crate::PoreReactor::reactor_errors::CascadeError;
use crate::PoreReactor::reactor_params::{KineticLaw, ReactorParams};
use RustedSciThe::symbolic::symbolic_engine::Expr;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// each enzyme in its own pore population, uniform density
    Single,
    /// all enzymes share every pore, with spatial profiles
    CoImmobilization,
}

/// Accepts exactly `single` and `co-immobilization`
impl FromStr for Topology {
    type Err = CascadeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Topology::Single),
            "co-immobilization" => Ok(Topology::CoImmobilization),
            other => Err(CascadeError::InvalidTopology(other.to_string())),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Single => write!(f, "single"),
            Topology::CoImmobilization => write!(f, "co-immobilization"),
        }
    }
}

/// Rate per unit enzyme density and its derivative with respect to the substrate
pub fn reaction_rate(kinetics: KineticLaw, k: f64, k_m: f64, s: f64) -> (f64, f64) {
    match kinetics {
        KineticLaw::FirstOrder => (k * s, k),
        KineticLaw::MichaelisMenten => {
            let denom = k_m + s;
            (k * s * k_m / denom, k * k_m * k_m / (denom * denom))
        }
    }
}

/// One enzymatic term in the balance of a species
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionTerm {
    pub enzyme: usize,
    /// species consumed by the enzyme
    pub substrate: usize,
    /// +1 sink, -1 source
    pub sign: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoreBalance {
    pub topology: Topology,
    pub species: Vec<String>,
    pub diffusivity: Vec<f64>,
    /// terms[i] lists the reaction terms of species i
    pub terms: Vec<Vec<ReactionTerm>>,
    pub kinetics: KineticLaw,
    pub reaction_const: Vec<f64>,
    pub michaelis_const: Vec<f64>,
    /// E_j(x) per enzyme
    pub profiles: Vec<EnzymeProfile>,
    /// decay_j(t) per enzyme
    pub decay: Vec<DecayFactor>,
    pub pore_length: f64,
}

/// Assembles the pore balance of every species for the given topology.
/// `profiles` and `decay` are indexed by enzyme; for the single topology the profiles are
/// replaced by uniform ones at the maximum density.
pub fn build_pore_balance(
    params: &ReactorParams,
    topology: Topology,
    profiles: Vec<EnzymeProfile>,
    decay: Vec<DecayFactor>,
) -> Result<PoreBalance, CascadeError> {
    let n_species = params.n_species();
    let n_enzymes = params.n_enzymes();
    if profiles.len() != n_enzymes || decay.len() != n_enzymes {
        return Err(CascadeError::Configuration(format!(
            "expected {} enzyme profiles and decay factors, got {} and {}",
            n_enzymes,
            profiles.len(),
            decay.len()
        )));
    }
    let profiles = match topology {
        Topology::Single => params
            .max_enzyme_density()
            .iter()
            .map(|&e_max| EnzymeProfile::uniform(e_max, params.pore_length()))
            .collect::<Result<Vec<_>, _>>()?,
        Topology::CoImmobilization => profiles,
    };

    let mut terms = vec![Vec::new(); n_species];
    for (i, species_terms) in terms.iter_mut().enumerate() {
        // enzyme i consumes species i
        if i < n_enzymes {
            species_terms.push(ReactionTerm {
                enzyme: i,
                substrate: i,
                sign: 1.0,
            });
        }
        // enzyme i-1 produces species i only where it shares the pore
        if topology == Topology::CoImmobilization && i > 0 {
            species_terms.push(ReactionTerm {
                enzyme: i - 1,
                substrate: i - 1,
                sign: -1.0,
            });
        }
    }

    Ok(PoreBalance {
        topology,
        species: params.species().to_vec(),
        diffusivity: params.diffusivity().to_vec(),
        terms,
        kinetics: params.kinetics(),
        reaction_const: params.reaction_const().to_vec(),
        michaelis_const: params.michaelis_const().to_vec(),
        profiles,
        decay,
        pore_length: params.pore_length(),
    })
}

impl PoreBalance {
    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    /// Net volumetric consumption of `species` (sink positive) for local concentrations `s`,
    /// enzyme densities `e` and decay factors `decay`, together with its gradient
    /// with respect to every species concentration.
    pub fn net_consumption(
        &self,
        species: usize,
        s: &[f64],
        e: &[f64],
        decay: &[f64],
    ) -> (f64, Vec<(usize, f64)>) {
        let mut value = 0.0;
        let mut gradient = Vec::with_capacity(self.terms[species].len());
        for term in &self.terms[species] {
            let j = term.enzyme;
            let (r, dr) = reaction_rate(
                self.kinetics,
                self.reaction_const[j],
                self.michaelis_const[j],
                s[term.substrate],
            );
            let activity = term.sign * e[j] * decay[j];
            value += activity * r;
            gradient.push((term.substrate, activity * dr));
        }
        (value, gradient)
    }

    /// Pore count per enzyme population entering the entrance flux.
    /// `pore_points` are the discretized pore positions the model is solved over.
    pub fn effective_pores_count(
        &self,
        pores_count: f64,
        pore_points: &[f64],
        equalize: bool,
    ) -> f64 {
        let n_enzymes = self.profiles.len().max(1) as f64;
        match self.topology {
            Topology::Single => pores_count / n_enzymes,
            Topology::CoImmobilization if equalize => {
                let entry = &self.profiles[0];
                let coef = pore_count_coefficient(&entry.evaluate(pore_points), entry.max_density);
                pores_count * coef / n_enzymes
            }
            Topology::CoImmobilization => pores_count,
        }
    }

    fn rate_expr(&self, term: &ReactionTerm) -> Expr {
        let s = Expr::Var(self.species[term.substrate].clone());
        let k = Expr::Const(self.reaction_const[term.enzyme]);
        match self.kinetics {
            KineticLaw::FirstOrder => k * s,
            KineticLaw::MichaelisMenten => {
                let k_m = Expr::Const(self.michaelis_const[term.enzyme]);
                k * s.clone() / (Expr::Const(1.0) + s / k_m)
            }
        }
    }

    /// Symbolic residual `D S'' - Σ σ E(x) decay(t) r(S)` of every species, for display
    pub fn equation_exprs(&self) -> Vec<Expr> {
        self.species
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut eq = Expr::Const(self.diffusivity[i]) * Expr::Var(format!("d2{}/dx2", name));
                for term in &self.terms[i] {
                    let j = term.enzyme;
                    let reaction = Expr::Const(term.sign)
                        * self.profiles[j].expr.clone()
                        * self.decay[j].expr.clone()
                        * self.rate_expr(term);
                    eq = eq - reaction;
                }
                eq
            })
            .collect()
    }
}
