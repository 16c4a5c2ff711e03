//! # Enzyme Profile Generator
//!
//! Builds the spatial distribution of an immobilized enzyme along the pore, `E(x)`, and its
//! temporal activity decay, `decay(t)`, as symbolic RustedSciThe expressions. Expressions are
//! built once from plain values (no references to mutable parameters) and evaluated on the
//! discretized grid by `lambdify1D`.
//!
//! ## Shapes
//!
//! ```text
//! linear: E(x) = E_max * (start + (end - start) * x/L)
//! step:   E(x) = E_max * (start*(1 - σ_up) + end*(σ_up - σ_down) + start*σ_down)
//!         σ_k  = 1 / (1 + exp(-smoothness*(x/L - x_k)))
//! ```
//!
//! For `step`, `start` is the baseline (before the step-up and after the step-down) and `end`
//! the plateau between the two transitions.
use crate::PoreReactor::reactor_errors::CascadeError;
use RustedSciThe::symbolic::symbolic_engine::Expr;
use std::collections::HashMap;

pub const DEFAULT_X_STEP_UP: f64 = 0.3;
pub const DEFAULT_X_STEP_DOWN: f64 = 0.7;
pub const DEFAULT_SMOOTHNESS: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileShape {
    Linear,
    /// smooth two-sided logistic step, transitions at fractions of L
    Step {
        x_step_up: f64,
        x_step_down: f64,
        smoothness: f64,
    },
}

impl ProfileShape {
    /// Shape from its exact name (`linear` or `step`) and a map of shape parameters.
    /// Absent step parameters take `DEFAULT_X_STEP_UP`, `DEFAULT_X_STEP_DOWN`, `DEFAULT_SMOOTHNESS`.
    pub fn from_name(
        name: &str,
        shape_params: &HashMap<String, f64>,
    ) -> Result<Self, CascadeError> {
        match name {
            "linear" => Ok(ProfileShape::Linear),
            "step" => Ok(ProfileShape::Step {
                x_step_up: shape_params
                    .get("x_step_up")
                    .copied()
                    .unwrap_or(DEFAULT_X_STEP_UP),
                x_step_down: shape_params
                    .get("x_step_down")
                    .copied()
                    .unwrap_or(DEFAULT_X_STEP_DOWN),
                smoothness: shape_params
                    .get("smoothness")
                    .copied()
                    .unwrap_or(DEFAULT_SMOOTHNESS),
            }),
            other => Err(CascadeError::UnsupportedProfile(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProfileShape::Linear => "linear",
            ProfileShape::Step { .. } => "step",
        }
    }

    fn validate(&self) -> Result<(), CascadeError> {
        if let ProfileShape::Step {
            x_step_up,
            x_step_down,
            smoothness,
        } = *self
        {
            if !(0.0..=1.0).contains(&x_step_up) {
                return Err(CascadeError::InvalidParameter(format!(
                    "x_step_up must be between 0 and 1, got {}",
                    x_step_up
                )));
            }
            if !(0.0..=1.0).contains(&x_step_down) {
                return Err(CascadeError::InvalidParameter(format!(
                    "x_step_down must be between 0 and 1, got {}",
                    x_step_down
                )));
            }
            if x_step_up >= x_step_down {
                return Err(CascadeError::InvalidParameter(format!(
                    "x_step_up ({}) must be less than x_step_down ({})",
                    x_step_up, x_step_down
                )));
            }
            if !(smoothness > 0.0) {
                return Err(CascadeError::InvalidParameter(format!(
                    "smoothness must be positive, got {}",
                    smoothness
                )));
            }
        }
        Ok(())
    }
}

/// Spatial enzyme density along the pore
#[derive(Debug, Clone, PartialEq)]
pub struct EnzymeProfile {
    pub max_density: f64,
    pub start: f64,
    pub end: f64,
    pub shape: ProfileShape,
    pub pore_length: f64,
    /// E(x), independent variable "x" in absolute pore coordinates
    pub expr: Expr,
}

impl EnzymeProfile {
    /// Constant profile at the maximum density
    pub fn uniform(max_density: f64, pore_length: f64) -> Result<Self, CascadeError> {
        build_profile(max_density, 1.0, 1.0, &ProfileShape::Linear, pore_length)
    }

    /// Profile values at the given pore positions
    pub fn evaluate(&self, x: &[f64]) -> Vec<f64> {
        let profile = self.expr.lambdify1D();
        x.iter().map(|&xi| profile(xi)).collect()
    }
}

fn logistic(x_frac: &Expr, center: f64, smoothness: f64) -> Expr {
    let exponent = Expr::Const(-smoothness) * (x_frac.clone() - Expr::Const(center));
    Expr::Const(1.0) / (Expr::Const(1.0) + Expr::Exp(Box::new(exponent)))
}

/// Builds the symbolic profile after validating every parameter
pub fn build_profile(
    max_density: f64,
    start: f64,
    end: f64,
    shape: &ProfileShape,
    pore_length: f64,
) -> Result<EnzymeProfile, CascadeError> {
    if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) {
        return Err(CascadeError::InvalidParameter(format!(
            "'start' and 'end' must be between 0 and 1, got {} and {}",
            start, end
        )));
    }
    if !(max_density >= 0.0) || !max_density.is_finite() {
        return Err(CascadeError::InvalidParameter(format!(
            "maximum enzyme density must be non-negative, got {}",
            max_density
        )));
    }
    if !(pore_length > 0.0) {
        return Err(CascadeError::InvalidParameter(format!(
            "pore length must be positive, got {}",
            pore_length
        )));
    }
    shape.validate()?;

    let x = Expr::Var("x".to_owned());
    let x_frac = x / Expr::Const(pore_length);
    let e_max = Expr::Const(max_density);
    let expr = match *shape {
        ProfileShape::Linear => {
            e_max * (Expr::Const(start) + Expr::Const(end - start) * x_frac)
        }
        ProfileShape::Step {
            x_step_up,
            x_step_down,
            smoothness,
        } => {
            let up = logistic(&x_frac, x_step_up, smoothness);
            let down = logistic(&x_frac, x_step_down, smoothness);
            e_max
                * (Expr::Const(start) * (Expr::Const(1.0) - up.clone())
                    + Expr::Const(end) * (up - down.clone())
                    + Expr::Const(start) * down)
        }
    };
    Ok(EnzymeProfile {
        max_density,
        start,
        end,
        shape: shape.clone(),
        pore_length,
        expr,
    })
}

/// Relative remaining activity of one enzyme over time
#[derive(Debug, Clone, PartialEq)]
pub struct DecayFactor {
    pub rate_constant: f64,
    /// decay(t), independent variable "t"
    pub expr: Expr,
}

impl DecayFactor {
    pub fn is_constant(&self) -> bool {
        self.rate_constant <= 0.0
    }

    pub fn evaluate(&self, t: &[f64]) -> Vec<f64> {
        if self.is_constant() {
            return vec![1.0; t.len()];
        }
        let decay = self.expr.lambdify1D();
        t.iter().map(|&ti| decay(ti)).collect()
    }
}

/// `1` for non-positive rate constants, `exp(-k t)` otherwise
pub fn build_decay(rate_constant: f64) -> DecayFactor {
    let expr = if rate_constant > 0.0 {
        let t = Expr::Var("t".to_owned());
        Expr::Exp(Box::new(Expr::Const(-rate_constant) * t))
    } else {
        Expr::Const(1.0)
    };
    DecayFactor {
        rate_constant,
        expr,
    }
}

/// Ratio of the reference density to the mean of the profile over the given points.
/// Returns 1 when the mean is not positive (or there are no points).
pub fn pore_count_coefficient(profile_values: &[f64], reference_density: f64) -> f64 {
    if profile_values.is_empty() {
        return 1.0;
    }
    let mean = profile_values.iter().sum::<f64>() / profile_values.len() as f64;
    if mean > 0.0 {
        reference_density / mean
    } else {
        1.0
    }
}
