//! # Lagrange–Radau collocation
//!
//! Both domains are mapped onto `[0, 1]` and split into `nfe` equal finite elements with `ncp`
//! Radau IIA points each. The element start is shared with the end of the previous element,
//! so continuity is implicit. A domain with `nfe` elements carries `nfe*ncp + 1` points.
//!
//! Within an element of width `h` the derivative at local node `k` is
//!
//! ```text
//! h · y'(u_k) = Σ_j D[k][j] · y(u_j),   u_0 = 0, u_1..u_ncp = Radau nodes
//! ```
//!
//! with `D` the derivative matrix of the Lagrange basis on the local nodes.
use crate::PoreReactor::reactor_errors::CascadeError;
use crate::PoreReactor::reactor_params::ContinuousDomain;
use nalgebra::DMatrix;

pub const MAX_COLLOCATION_POINTS: usize = 5;

/// Radau IIA nodes on (0, 1]
pub fn radau_nodes(ncp: usize) -> Result<Vec<f64>, CascadeError> {
    let nodes = match ncp {
        1 => vec![1.0],
        2 => vec![1.0 / 3.0, 1.0],
        3 => vec![0.155051025721682, 0.644948974278318, 1.0],
        4 => vec![0.088587959512704, 0.409466864440735, 0.787659461760847, 1.0],
        5 => vec![
            0.057104196114518,
            0.276843013638124,
            0.583590432368917,
            0.860240135656219,
            1.0,
        ],
        _ => {
            return Err(CascadeError::Discretization(format!(
                "number of collocation points must be between 1 and {}, got {}",
                MAX_COLLOCATION_POINTS, ncp
            )));
        }
    };
    Ok(nodes)
}

/// Lagrange derivative matrix on `nodes`, rows for every node except the first
fn derivative_matrix(nodes: &[f64]) -> DMatrix<f64> {
    let n = nodes.len();
    // barycentric weights
    let weights: Vec<f64> = (0..n)
        .map(|j| {
            let prod: f64 = (0..n)
                .filter(|&m| m != j)
                .map(|m| nodes[j] - nodes[m])
                .product();
            1.0 / prod
        })
        .collect();
    DMatrix::from_fn(n - 1, n, |row, j| {
        let k = row + 1;
        if j == k {
            (0..n)
                .filter(|&m| m != k)
                .map(|m| 1.0 / (nodes[k] - nodes[m]))
                .sum()
        } else {
            (weights[j] / weights[k]) / (nodes[k] - nodes[j])
        }
    })
}

/// Mesh of one domain in dimensionless coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct CollocationMesh {
    pub nfe: usize,
    pub ncp: usize,
    /// element width
    pub h: f64,
    /// all points on [0, 1]
    pub points: Vec<f64>,
    /// (ncp) x (ncp + 1) derivative matrix on the local nodes
    pub derivative: DMatrix<f64>,
}

impl CollocationMesh {
    pub fn new(nfe: usize, ncp: usize) -> Result<Self, CascadeError> {
        if nfe == 0 {
            return Err(CascadeError::Discretization(
                "number of finite elements must be positive".to_string(),
            ));
        }
        let radau = radau_nodes(ncp)?;
        let h = 1.0 / nfe as f64;
        let mut points = Vec::with_capacity(nfe * ncp + 1);
        points.push(0.0);
        for e in 0..nfe {
            let start = e as f64 * h;
            for (k, u) in radau.iter().enumerate() {
                // the last node of the last element lands exactly on 1
                if e + 1 == nfe && k + 1 == ncp {
                    points.push(1.0);
                } else {
                    points.push(start + u * h);
                }
            }
        }
        let mut nodes = Vec::with_capacity(ncp + 1);
        nodes.push(0.0);
        nodes.extend(radau);
        Ok(Self {
            nfe,
            ncp,
            h,
            points,
            derivative: derivative_matrix(&nodes),
        })
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Collocation equation of point `q >= 1`: (element start index, local node k in 1..=ncp)
    pub fn collocation_point(&self, q: usize) -> (usize, usize) {
        let p = q - 1;
        let element = p / self.ncp;
        (element * self.ncp, p % self.ncp + 1)
    }

    /// Points mapped onto a physical domain
    pub fn scaled_points(&self, domain: &ContinuousDomain) -> Vec<f64> {
        self.points
            .iter()
            .map(|u| domain.start + u * domain.length())
            .collect()
    }

    /// Residual `h·y'(q) - Σ D y` of the collocation equation at point `q >= 1`
    pub fn collocation_residual(&self, q: usize, y: &[f64], dy: &[f64]) -> f64 {
        let (start, k) = self.collocation_point(q);
        let sum: f64 = (0..=self.ncp)
            .map(|j| self.derivative[(k - 1, j)] * y[start + j])
            .sum();
        self.h * dy[q] - sum
    }
}

/// Mesh granularity of both domains
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshConfig {
    pub time_elements: usize,
    pub time_points: usize,
    pub space_elements: usize,
    pub space_points: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            time_elements: 60,
            time_points: 2,
            space_elements: 20,
            space_points: 3,
        }
    }
}

impl MeshConfig {
    pub fn new(
        time_elements: usize,
        time_points: usize,
        space_elements: usize,
        space_points: usize,
    ) -> Self {
        Self {
            time_elements,
            time_points,
            space_elements,
            space_points,
        }
    }

    pub fn validate(&self) -> Result<(), CascadeError> {
        if self.time_elements == 0 || self.space_elements == 0 {
            return Err(CascadeError::Discretization(format!(
                "element counts must be positive, got time {} space {}",
                self.time_elements, self.space_elements
            )));
        }
        for ncp in [self.time_points, self.space_points] {
            if !(1..=MAX_COLLOCATION_POINTS).contains(&ncp) {
                return Err(CascadeError::Discretization(format!(
                    "number of collocation points must be between 1 and {}, got {}",
                    MAX_COLLOCATION_POINTS, ncp
                )));
            }
        }
        Ok(())
    }

    pub fn time_mesh(&self) -> Result<CollocationMesh, CascadeError> {
        CollocationMesh::new(self.time_elements, self.time_points)
    }

    pub fn space_mesh(&self) -> Result<CollocationMesh, CascadeError> {
        CollocationMesh::new(self.space_elements, self.space_points)
    }
}
