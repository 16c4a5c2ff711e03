//! # Domain & Parameter Store
//!
//! Holds the ordered species set of the cascade, the enzymes converting each species into the
//! next one, the two continuous domains (reaction time `[0, t_f]` and pore position `[0, L]`)
//! and all scalar/per-species/per-enzyme physical constants.
//!
//! ## Nomenclature
//!
//! | Symbol | Description | Units (reference set) |
//! |--------|-------------|-------|
//! | `S_i,0` | initial bulk concentration of species i | mM |
//! | `t_f` | total reaction time | min |
//! | `N_p` | total pore count | - |
//! | `L` | pore length | dm |
//! | `A` | pore cross-sectional area | dm² |
//! | `D_i` | diffusivity of species i | dm²/min |
//! | `E_j^max` | maximum surface density of enzyme j | μmol/dm² |
//! | `k_j` | first-order rate constant of enzyme j | dm²/μmol/min |
//! | `K_M,j` | Michaelis constant of enzyme j | mM |
//!
//! `ReactorConfig` is the raw record (serde-friendly, keyed by names), `ReactorParams` is the
//! validated, immutable snapshot a model is built from. Parameter sweeps build a new
//! `ReactorParams` per point (see [`ReactorParams::with_max_density`]), a model never observes
//! changes made after it was built.
use crate::PoreReactor::reactor_errors::CascadeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kinetic law of the immobilized enzymes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KineticLaw {
    /// r = k·E·S
    #[default]
    FirstOrder,
    /// r = k·E·S / (1 + S/K_M), reduces to the first-order law for S << K_M
    MichaelisMenten,
}

/// Raw configuration record. Per-species and per-enzyme values are keyed by name,
/// the order of the cascade is given by `species` and `enzymes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorConfig {
    pub species: Vec<String>,
    /// enzyme j converts species j into species j+1
    pub enzymes: Vec<String>,
    pub initial_concentrations: HashMap<String, f64>,
    pub reaction_time: f64,
    pub pores_count: f64,
    pub pore_length: f64,
    pub pore_area: f64,
    pub diffusivity: HashMap<String, f64>,
    pub max_enzyme_density: HashMap<String, f64>,
    pub reaction_const: HashMap<String, f64>,
    pub michaelis_const: HashMap<String, f64>,
    #[serde(default)]
    pub kinetics: KineticLaw,
}

impl Default for ReactorConfig {
    /// Reference batch reactor: S1 -> S2 -> S3 over 480 min
    fn default() -> Self {
        let species: Vec<String> = ["S1", "S2", "S3"].iter().map(|s| s.to_string()).collect();
        let enzymes: Vec<String> = ["Enzyme_A", "Enzyme_B"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self {
            initial_concentrations: HashMap::from([
                ("S1".to_string(), 1000.0),
                ("S2".to_string(), 0.1),
                ("S3".to_string(), 0.1),
            ]),
            reaction_time: 480.0,
            pores_count: 5e14,
            pore_length: 2e-4,
            pore_area: 8e-15,
            diffusivity: HashMap::from([
                ("S1".to_string(), 1e-8),
                ("S2".to_string(), 5e-6),
                ("S3".to_string(), 5e-6),
            ]),
            max_enzyme_density: HashMap::from([
                ("Enzyme_A".to_string(), 5.0),
                ("Enzyme_B".to_string(), 5.0),
            ]),
            reaction_const: HashMap::from([
                ("Enzyme_A".to_string(), 30.0),
                ("Enzyme_B".to_string(), 80.0),
            ]),
            michaelis_const: HashMap::from([
                ("Enzyme_A".to_string(), 5.0),
                ("Enzyme_B".to_string(), 10.0),
            ]),
            kinetics: KineticLaw::FirstOrder,
            species,
            enzymes,
        }
    }
}

/// Continuous, ordered interval of an independent variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuousDomain {
    pub start: f64,
    pub end: f64,
}

impl ContinuousDomain {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Validated, read-only parameter snapshot of one reactor
#[derive(Debug, Clone, PartialEq)]
pub struct ReactorParams {
    species: Vec<String>,
    enzymes: Vec<String>,
    initial_concentrations: Vec<f64>,
    diffusivity: Vec<f64>,
    max_enzyme_density: Vec<f64>,
    reaction_const: Vec<f64>,
    michaelis_const: Vec<f64>,
    pores_count: f64,
    pore_area: f64,
    kinetics: KineticLaw,
    time_domain: ContinuousDomain,
    pore_domain: ContinuousDomain,
}

fn lookup(
    map: &HashMap<String, f64>,
    key: &str,
    table: &str,
) -> Result<f64, CascadeError> {
    map.get(key).copied().ok_or_else(|| {
        CascadeError::Configuration(format!("missing key '{}' in '{}'", key, table))
    })
}

impl ReactorParams {
    /// Validates the raw record and builds the species set and both domains
    pub fn from_config(config: &ReactorConfig) -> Result<Self, CascadeError> {
        if config.species.len() < 2 {
            return Err(CascadeError::Configuration(
                "cascade needs at least two species".to_string(),
            ));
        }
        if config.enzymes.len() + 1 != config.species.len() {
            return Err(CascadeError::Configuration(format!(
                "{} species need {} enzymes, got {}",
                config.species.len(),
                config.species.len() - 1,
                config.enzymes.len()
            )));
        }
        for (i, name) in config.species.iter().enumerate() {
            if config.species[..i].contains(name) {
                return Err(CascadeError::Configuration(format!(
                    "duplicate species '{}'",
                    name
                )));
            }
        }
        for (j, name) in config.enzymes.iter().enumerate() {
            if config.enzymes[..j].contains(name) {
                return Err(CascadeError::Configuration(format!(
                    "duplicate enzyme '{}'",
                    name
                )));
            }
        }
        // domain bounds and geometry
        let positive = [
            ("reaction_time", config.reaction_time),
            ("pore_length", config.pore_length),
            ("pores_count", config.pores_count),
            ("pore_area", config.pore_area),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(CascadeError::Configuration(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let mut initial_concentrations = Vec::with_capacity(config.species.len());
        let mut diffusivity = Vec::with_capacity(config.species.len());
        for s in &config.species {
            let c0 = lookup(&config.initial_concentrations, s, "initial_concentrations")?;
            if !(c0 >= 0.0) || !c0.is_finite() {
                return Err(CascadeError::Configuration(format!(
                    "initial concentration of {} must be non-negative, got {}",
                    s, c0
                )));
            }
            let d = lookup(&config.diffusivity, s, "diffusivity")?;
            if !(d > 0.0) {
                return Err(CascadeError::Configuration(format!(
                    "diffusivity of {} must be positive, got {}",
                    s, d
                )));
            }
            initial_concentrations.push(c0);
            diffusivity.push(d);
        }

        let mut max_enzyme_density = Vec::with_capacity(config.enzymes.len());
        let mut reaction_const = Vec::with_capacity(config.enzymes.len());
        let mut michaelis_const = Vec::with_capacity(config.enzymes.len());
        for e in &config.enzymes {
            let e_max = lookup(&config.max_enzyme_density, e, "max_enzyme_density")?;
            let k = lookup(&config.reaction_const, e, "reaction_const")?;
            let k_m = lookup(&config.michaelis_const, e, "michaelis_const")?;
            if !(e_max >= 0.0) || !(k >= 0.0) {
                return Err(CascadeError::Configuration(format!(
                    "enzyme {}: density and rate constant must be non-negative",
                    e
                )));
            }
            if !(k_m > 0.0) {
                return Err(CascadeError::Configuration(format!(
                    "enzyme {}: Michaelis constant must be positive, got {}",
                    e, k_m
                )));
            }
            max_enzyme_density.push(e_max);
            reaction_const.push(k);
            michaelis_const.push(k_m);
        }

        Ok(Self {
            species: config.species.clone(),
            enzymes: config.enzymes.clone(),
            initial_concentrations,
            diffusivity,
            max_enzyme_density,
            reaction_const,
            michaelis_const,
            pores_count: config.pores_count,
            pore_area: config.pore_area,
            kinetics: config.kinetics,
            time_domain: ContinuousDomain::new(0.0, config.reaction_time),
            pore_domain: ContinuousDomain::new(0.0, config.pore_length),
        })
    }

    /// Copy of the snapshot with one enzyme loading replaced (parameter sweeps)
    pub fn with_max_density(&self, enzyme: &str, value: f64) -> Result<Self, CascadeError> {
        let j = self.enzyme_index(enzyme)?;
        if !(value >= 0.0) || !value.is_finite() {
            return Err(CascadeError::InvalidParameter(format!(
                "maximum density of {} must be non-negative, got {}",
                enzyme, value
            )));
        }
        let mut params = self.clone();
        params.max_enzyme_density[j] = value;
        Ok(params)
    }

    /// Copy of the snapshot with another kinetic law
    pub fn with_kinetics(&self, kinetics: KineticLaw) -> Self {
        let mut params = self.clone();
        params.kinetics = kinetics;
        params
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }
    pub fn enzymes(&self) -> &[String] {
        &self.enzymes
    }
    pub fn n_species(&self) -> usize {
        self.species.len()
    }
    pub fn n_enzymes(&self) -> usize {
        self.enzymes.len()
    }
    pub fn species_index(&self, name: &str) -> Result<usize, CascadeError> {
        self.species
            .iter()
            .position(|s| s == name)
            .ok_or_else(|| CascadeError::Configuration(format!("unknown species '{}'", name)))
    }
    pub fn enzyme_index(&self, name: &str) -> Result<usize, CascadeError> {
        self.enzymes
            .iter()
            .position(|e| e == name)
            .ok_or_else(|| CascadeError::Configuration(format!("unknown enzyme '{}'", name)))
    }
    pub fn initial_concentrations(&self) -> &[f64] {
        &self.initial_concentrations
    }
    pub fn diffusivity(&self) -> &[f64] {
        &self.diffusivity
    }
    pub fn max_enzyme_density(&self) -> &[f64] {
        &self.max_enzyme_density
    }
    pub fn reaction_const(&self) -> &[f64] {
        &self.reaction_const
    }
    pub fn michaelis_const(&self) -> &[f64] {
        &self.michaelis_const
    }
    pub fn pores_count(&self) -> f64 {
        self.pores_count
    }
    pub fn pore_area(&self) -> f64 {
        self.pore_area
    }
    pub fn pore_length(&self) -> f64 {
        self.pore_domain.length()
    }
    pub fn reaction_time(&self) -> f64 {
        self.time_domain.length()
    }
    pub fn kinetics(&self) -> KineticLaw {
        self.kinetics
    }
    pub fn time_domain(&self) -> ContinuousDomain {
        self.time_domain
    }
    pub fn pore_domain(&self) -> ContinuousDomain {
        self.pore_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_config_is_valid() {
        let params = ReactorParams::from_config(&ReactorConfig::default()).unwrap();
        assert_eq!(params.n_species(), 3);
        assert_eq!(params.n_enzymes(), 2);
        assert_eq!(params.species_index("S2").unwrap(), 1);
        assert_eq!(params.pore_length(), 2e-4);
        assert_eq!(params.reaction_time(), 480.0);
        assert_eq!(params.time_domain().start, 0.0);
        assert_eq!(params.diffusivity(), &[1e-8, 5e-6, 5e-6]);
        assert_eq!(params.kinetics(), KineticLaw::FirstOrder);
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let mut config = ReactorConfig::default();
        config.diffusivity.remove("S3");
        let err = ReactorParams::from_config(&config).unwrap_err();
        match err {
            CascadeError::Configuration(msg) => assert!(msg.contains("S3")),
            other => panic!("unexpected error {:?}", other),
        }

        let mut config = ReactorConfig::default();
        config.michaelis_const.remove("Enzyme_B");
        assert!(matches!(
            ReactorParams::from_config(&config),
            Err(CascadeError::Configuration(_))
        ));
    }

    #[test]
    fn test_non_positive_domain_bounds_rejected() {
        let mut config = ReactorConfig::default();
        config.pore_length = 0.0;
        assert!(matches!(
            ReactorParams::from_config(&config),
            Err(CascadeError::Configuration(_))
        ));
        let mut config = ReactorConfig::default();
        config.reaction_time = -1.0;
        assert!(matches!(
            ReactorParams::from_config(&config),
            Err(CascadeError::Configuration(_))
        ));
    }

    #[test]
    fn test_enzyme_count_must_match_cascade() {
        let mut config = ReactorConfig::default();
        config.enzymes.pop();
        assert!(matches!(
            ReactorParams::from_config(&config),
            Err(CascadeError::Configuration(_))
        ));
    }

    #[test]
    fn test_with_max_density_leaves_original_untouched() {
        let params = ReactorParams::from_config(&ReactorConfig::default()).unwrap();
        let swept = params.with_max_density("Enzyme_A", 8.0).unwrap();
        assert_eq!(params.max_enzyme_density()[0], 5.0);
        assert_eq!(swept.max_enzyme_density()[0], 8.0);
        assert!(params.with_max_density("Enzyme_C", 1.0).is_err());
        assert!(params.with_max_density("Enzyme_A", -1.0).is_err());
    }
}
