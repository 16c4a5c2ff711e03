//! # Reactor model
//!
//! `build_reactor_model` combines a parameter snapshot, an immobilization topology, enzyme
//! decay coefficients and enzyme profile configuration into a `ReactorModel` in state
//! `Built`. Discretization and solving are done by `solve_orchestrator`; after that the model
//! answers read queries on the discretized grid.
//!
//! ## Profile configuration
//!
//! `ProfileConfig::from_json` accepts the layout
//!
//! ```json
//! {
//!   "default_fun": "linear",
//!   "adjust_Np": false,
//!   "enzymeA": {"fun": "step", "start": 0, "end": 1, "x_step_up": 0.2, "x_step_down": 0.6, "smoothness": 80},
//!   "enzymeB": {"start": 0, "end": 1}
//! }
//! ```
//!
//! Enzyme keys are matched ignoring case and underscores (`enzymeA` matches `Enzyme_A`).
//! The shape of an enzyme is its own `fun`, then `default_fun`, then `linear`. Missing
//! `start`/`end` take the stage defaults: the first enzyme starts at full density and ends
//! at zero, later enzymes the other way round.
use crate::PoreReactor::bulk_scale::{BulkBalance, build_bulk_balance};
use crate::PoreReactor::discrete_system::{CascadeSystem, PoreVar};
use crate::PoreReactor::enzyme_profile::{
    EnzymeProfile, ProfileShape, build_decay, build_profile,
};
use crate::PoreReactor::pore_scale::{PoreBalance, Topology, build_pore_balance};
use crate::PoreReactor::reactor_errors::CascadeError;
use crate::PoreReactor::reactor_params::ReactorParams;
use crate::PoreReactor::solver_config::TerminationCondition;
use log::info;
use nalgebra::DVector;
use serde_json::Value;
use std::collections::HashMap;

/// Lifecycle of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Built,
    Discretized,
    Solved(TerminationCondition),
}

/// Profile of one enzyme: shape and density fractions at the two ends (or baseline/plateau)
#[derive(Debug, Clone, PartialEq)]
pub struct EnzymeProfileSpec {
    pub shape: ProfileShape,
    pub start: f64,
    pub end: f64,
}

impl EnzymeProfileSpec {
    pub fn linear(start: f64, end: f64) -> Self {
        Self {
            shape: ProfileShape::Linear,
            start,
            end,
        }
    }

    pub fn step(start: f64, end: f64, x_step_up: f64, x_step_down: f64, smoothness: f64) -> Self {
        Self {
            shape: ProfileShape::Step {
                x_step_up,
                x_step_down,
                smoothness,
            },
            start,
            end,
        }
    }

    /// linear decreasing for the entry enzyme, increasing for the later ones
    pub fn stage_default(enzyme_index: usize) -> Self {
        if enzyme_index == 0 {
            Self::linear(1.0, 0.0)
        } else {
            Self::linear(0.0, 1.0)
        }
    }
}

/// Spatial enzyme distribution used by the co-immobilization topology
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileConfig {
    pub enzymes: HashMap<String, EnzymeProfileSpec>,
    /// scale the pore count so that the entry enzyme has the total activity of a uniform loading
    pub equalize_pore_count: bool,
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn json_number(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    enzyme: &str,
) -> Result<Option<f64>, CascadeError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            CascadeError::Configuration(format!("'{}' of {} must be a number", key, enzyme))
        }),
    }
}

impl ProfileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enzyme(mut self, enzyme: &str, spec: EnzymeProfileSpec) -> Self {
        self.enzymes.insert(enzyme.to_string(), spec);
        self
    }

    pub fn with_equalized_pore_count(mut self, equalize: bool) -> Self {
        self.equalize_pore_count = equalize;
        self
    }

    /// Profile of the `index`-th enzyme, stage default when not configured
    pub fn spec_for(&self, index: usize, enzyme: &str) -> EnzymeProfileSpec {
        self.enzymes
            .get(enzyme)
            .cloned()
            .unwrap_or_else(|| EnzymeProfileSpec::stage_default(index))
    }

    /// Every configured profile must belong to one of `enzymes`
    pub fn check_enzymes(&self, enzymes: &[String]) -> Result<(), CascadeError> {
        match self.enzymes.keys().find(|key| !enzymes.contains(*key)) {
            Some(key) => Err(CascadeError::Configuration(format!(
                "profile given for unknown enzyme '{}'",
                key
            ))),
            None => Ok(()),
        }
    }

    pub fn from_json(json: &str, enzymes: &[String]) -> Result<Self, CascadeError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CascadeError::Configuration(format!("invalid profile JSON: {}", e)))?;
        Self::from_value(&value, enzymes)
    }

    pub fn from_value(value: &Value, enzymes: &[String]) -> Result<Self, CascadeError> {
        let root = value.as_object().ok_or_else(|| {
            CascadeError::Configuration("profile configuration must be a JSON object".to_string())
        })?;
        let default_fun = match root.get("default_fun") {
            None => "linear".to_string(),
            Some(v) => v
                .as_str()
                .ok_or_else(|| {
                    CascadeError::Configuration("'default_fun' must be a string".to_string())
                })?
                .to_string(),
        };
        let equalize_pore_count = match root.get("adjust_Np") {
            None => false,
            Some(v) => v.as_bool().ok_or_else(|| {
                CascadeError::Configuration("'adjust_Np' must be a boolean".to_string())
            })?,
        };

        let wanted: Vec<String> = enzymes.iter().map(|e| normalize_key(e)).collect();
        if let Some(key) = root
            .keys()
            .filter(|key| key.as_str() != "default_fun" && key.as_str() != "adjust_Np")
            .find(|key| !wanted.contains(&normalize_key(key)))
        {
            return Err(CascadeError::Configuration(format!(
                "profile entry '{}' matches no enzyme of {:?}",
                key, enzymes
            )));
        }

        let mut config = ProfileConfig {
            enzymes: HashMap::new(),
            equalize_pore_count,
        };
        for (index, enzyme) in enzymes.iter().enumerate() {
            let target = normalize_key(enzyme);
            let entry = root
                .iter()
                .find(|(key, _)| normalize_key(key) == target)
                .map(|(_, v)| v);
            let empty = serde_json::Map::new();
            let obj = match entry {
                None => &empty,
                Some(v) => v.as_object().ok_or_else(|| {
                    CascadeError::Configuration(format!("profile of {} must be a JSON object", enzyme))
                })?,
            };
            let fun = match obj.get("fun") {
                None => default_fun.clone(),
                Some(v) => v
                    .as_str()
                    .ok_or_else(|| {
                        CascadeError::Configuration(format!("'fun' of {} must be a string", enzyme))
                    })?
                    .to_string(),
            };
            let mut shape_params = HashMap::new();
            for key in ["x_step_up", "x_step_down", "smoothness"] {
                if let Some(v) = json_number(obj, key, enzyme)? {
                    shape_params.insert(key.to_string(), v);
                }
            }
            let stage = EnzymeProfileSpec::stage_default(index);
            let spec = EnzymeProfileSpec {
                shape: ProfileShape::from_name(&fun, &shape_params)?,
                start: json_number(obj, "start", enzyme)?.unwrap_or(stage.start),
                end: json_number(obj, "end", enzyme)?.unwrap_or(stage.end),
            };
            config.enzymes.insert(enzyme.clone(), spec);
        }
        Ok(config)
    }
}

/// First-order deactivation constants per enzyme, 0 for a stable enzyme
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecayCoefficients {
    pub rates: HashMap<String, f64>,
}

impl DecayCoefficients {
    /// Every enzyme of `params` with rate 0
    pub fn none(params: &ReactorParams) -> Self {
        Self {
            rates: params.enzymes().iter().map(|e| (e.clone(), 0.0)).collect(),
        }
    }

    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self {
            rates: pairs.iter().map(|(e, k)| (e.to_string(), *k)).collect(),
        }
    }

    /// Rates in enzyme order. Every enzyme must be listed and no other key is allowed.
    pub fn rates_for(&self, params: &ReactorParams) -> Result<Vec<f64>, CascadeError> {
        if let Some(key) = self.rates.keys().find(|key| !params.enzymes().contains(*key)) {
            return Err(CascadeError::Configuration(format!(
                "decay coefficient given for unknown enzyme '{}'",
                key
            )));
        }
        params
            .enzymes()
            .iter()
            .map(|e| {
                self.rates.get(e).copied().ok_or_else(|| {
                    CascadeError::Configuration(format!("missing decay coefficient of '{}'", e))
                })
            })
            .collect()
    }
}

/// Built (and possibly discretized and solved) two-scale model
#[derive(Debug, Clone)]
pub struct ReactorModel {
    pub(crate) params: ReactorParams,
    pub(crate) topology: Topology,
    pub(crate) profile_config: ProfileConfig,
    pub(crate) decay: DecayCoefficients,
    pub(crate) pore: PoreBalance,
    pub(crate) bulk: BulkBalance,
    pub(crate) state: ModelState,
    pub(crate) system: Option<CascadeSystem>,
    pub(crate) values: Option<DVector<f64>>,
}

/// Builds the pore and bulk balances from an owned copy of `params`
pub fn build_reactor_model(
    params: &ReactorParams,
    topology: Topology,
    decay: &DecayCoefficients,
    profile_config: &ProfileConfig,
) -> Result<ReactorModel, CascadeError> {
    info!(
        "building {} model with {} species and {} enzymes",
        topology,
        params.n_species(),
        params.n_enzymes()
    );
    profile_config.check_enzymes(params.enzymes())?;
    let rates = decay.rates_for(params)?;
    let decay_factors = rates.iter().map(|&k| build_decay(k)).collect();

    let profiles: Vec<EnzymeProfile> = match topology {
        Topology::Single => params
            .max_enzyme_density()
            .iter()
            .map(|&e_max| EnzymeProfile::uniform(e_max, params.pore_length()))
            .collect::<Result<_, _>>()?,
        Topology::CoImmobilization => params
            .enzymes()
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let spec = profile_config.spec_for(j, name);
                info!(
                    "{} profile: {} from {} to {}",
                    name,
                    spec.shape.name(),
                    spec.start,
                    spec.end
                );
                build_profile(
                    params.max_enzyme_density()[j],
                    spec.start,
                    spec.end,
                    &spec.shape,
                    params.pore_length(),
                )
            })
            .collect::<Result<_, _>>()?,
    };

    let pore = build_pore_balance(params, topology, profiles, decay_factors)?;
    let bulk = build_bulk_balance(params);
    info!("model built");
    Ok(ReactorModel {
        params: params.clone(),
        topology,
        profile_config: profile_config.clone(),
        decay: decay.clone(),
        pore,
        bulk,
        state: ModelState::Built,
        system: None,
        values: None,
    })
}

impl ReactorModel {
    pub fn state(&self) -> ModelState {
        self.state
    }
    pub fn params(&self) -> &ReactorParams {
        &self.params
    }
    pub fn topology(&self) -> Topology {
        self.topology
    }
    pub fn profile_config(&self) -> &ProfileConfig {
        &self.profile_config
    }
    pub fn decay_coefficients(&self) -> &DecayCoefficients {
        &self.decay
    }
    pub fn pore_balance(&self) -> &PoreBalance {
        &self.pore
    }
    pub fn bulk_balance(&self) -> &BulkBalance {
        &self.bulk
    }
    pub fn system(&self) -> Option<&CascadeSystem> {
        self.system.as_ref()
    }
    /// current values of every unknown (initial guess before the solve)
    pub fn values(&self) -> Option<&DVector<f64>> {
        self.values.as_ref()
    }

    fn discretized(&self) -> Result<(&CascadeSystem, &DVector<f64>), CascadeError> {
        match (&self.system, &self.values) {
            (Some(system), Some(values)) => Ok((system, values)),
            _ => Err(CascadeError::Discretization(
                "model has not been discretized".to_string(),
            )),
        }
    }

    pub fn time_points(&self) -> Result<Vec<f64>, CascadeError> {
        Ok(self.discretized()?.0.time_points.clone())
    }

    pub fn pore_points(&self) -> Result<Vec<f64>, CascadeError> {
        Ok(self.discretized()?.0.pore_points.clone())
    }

    /// Index of the time point nearest to `t`
    pub fn nearest_time_index(&self, t: f64) -> Result<usize, CascadeError> {
        let (system, _) = self.discretized()?;
        let mut best = 0;
        for (i, ti) in system.time_points.iter().enumerate() {
            if (ti - t).abs() < (system.time_points[best] - t).abs() {
                best = i;
            }
        }
        Ok(best)
    }

    /// (t, S_bulk) over the time grid
    pub fn bulk_trajectory(&self, species: &str) -> Result<Vec<(f64, f64)>, CascadeError> {
        let c = self.params.species_index(species)?;
        let (system, z) = self.discretized()?;
        Ok(system
            .time_points
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, z[system.layout.bulk(c, i)]))
            .collect())
    }

    /// (x, S_pore) at the grid time nearest to `t`
    pub fn pore_profile(&self, species: &str, t: f64) -> Result<Vec<(f64, f64)>, CascadeError> {
        let c = self.params.species_index(species)?;
        let i = self.nearest_time_index(t)?;
        let (system, z) = self.discretized()?;
        Ok(system
            .pore_points
            .iter()
            .enumerate()
            .map(|(j, &x)| (x, z[system.layout.pore(i, c, PoreVar::Value, j)]))
            .collect())
    }

    /// (x, dS/dx) at the grid time nearest to `t`
    pub fn pore_gradient_profile(
        &self,
        species: &str,
        t: f64,
    ) -> Result<Vec<(f64, f64)>, CascadeError> {
        let c = self.params.species_index(species)?;
        let i = self.nearest_time_index(t)?;
        let (system, z) = self.discretized()?;
        Ok(system
            .pore_points
            .iter()
            .enumerate()
            .map(|(j, &x)| (x, system.pore_gradient(z, c, i, j)))
            .collect())
    }

    /// (t, flux) of the entrance flux of `species`
    pub fn flux_trajectory(&self, species: &str) -> Result<Vec<(f64, f64)>, CascadeError> {
        let c = self.params.species_index(species)?;
        let (system, z) = self.discretized()?;
        Ok(system
            .time_points
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, system.flux_at(z, c, i)))
            .collect())
    }

    /// (x, E) of an enzyme on the pore grid
    pub fn enzyme_profile_values(&self, enzyme: &str) -> Result<Vec<(f64, f64)>, CascadeError> {
        let j = self.params.enzyme_index(enzyme)?;
        let (system, _) = self.discretized()?;
        Ok(system
            .pore_points
            .iter()
            .copied()
            .zip(system.enzyme_values[j].iter().copied())
            .collect())
    }

    /// (t, decay) of an enzyme on the time grid
    pub fn decay_values(&self, enzyme: &str) -> Result<Vec<(f64, f64)>, CascadeError> {
        let j = self.params.enzyme_index(enzyme)?;
        let (system, _) = self.discretized()?;
        Ok(system
            .time_points
            .iter()
            .copied()
            .zip(system.decay_values[j].iter().copied())
            .collect())
    }

    /// Bulk concentration at the end of the reaction
    pub fn final_bulk(&self, species: &str) -> Result<f64, CascadeError> {
        let trajectory = self.bulk_trajectory(species)?;
        trajectory
            .last()
            .map(|&(_, s)| s)
            .ok_or_else(|| CascadeError::Discretization("empty time grid".to_string()))
    }
}
