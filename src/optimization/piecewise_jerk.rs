//! Piecewise-jerk quadratic program over longitudinal position
//!
//! The decision vector is the position sequence s(t) at uniform time
//! steps; velocity, acceleration, and jerk are tied to it by forward
//! differencing, so the whole problem is a box-constrained QP in s.
//! The endpoint triples (s, ds, dds) are pinned exactly by fixing the
//! first three and last two coordinates; the remaining coordinates are
//! found by a dense Cholesky solve of the reduced normal equations, with
//! escalating quadratic penalties re-solved for any violated derivative
//! bound.

use std::collections::HashMap;

use log::debug;
use nalgebra::{DMatrix, DVector};

const MAX_PENALTY_ROUNDS: usize = 30;

/// Quadratic program producing a smooth s(t) profile.
///
/// Weights: `[s, velocity, acceleration, jerk, reference]`.
pub struct PathTimeQpProblem {
    n: usize,
    dt: f64,
    weights: [f64; 5],
    init_s: [f64; 3],
    end_s: [f64; 3],
    s_bounds: (f64, f64),
    ds_bounds: (f64, f64),
    dds_bounds: (f64, f64),
    jerk_bound: f64,
    desire_derivative: f64,
    s_ref: Vec<f64>,
    solution_s: Vec<f64>,
    solution_ds: Vec<f64>,
    solution_dds: Vec<f64>,
}

impl Default for PathTimeQpProblem {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTimeQpProblem {
    pub fn new() -> Self {
        Self {
            n: 0,
            dt: 0.1,
            weights: [0.0; 5],
            init_s: [0.0; 3],
            end_s: [0.0; 3],
            s_bounds: (f64::NEG_INFINITY, f64::INFINITY),
            ds_bounds: (f64::NEG_INFINITY, f64::INFINITY),
            dds_bounds: (f64::NEG_INFINITY, f64::INFINITY),
            jerk_bound: f64::INFINITY,
            desire_derivative: 0.0,
            s_ref: Vec::new(),
            solution_s: Vec::new(),
            solution_ds: Vec::new(),
            solution_dds: Vec::new(),
        }
    }

    /// Set up an `n`-point problem at time step `dt` with objective
    /// weights `w` and initial/terminal (s, ds, dds) triples.
    pub fn init_problem(&mut self, n: usize, dt: f64, w: [f64; 5], init_s: [f64; 3], end_s: [f64; 3]) {
        self.n = n;
        self.dt = dt;
        self.weights = w;
        self.init_s = init_s;
        self.end_s = end_s;
    }

    pub fn set_zero_order_bounds(&mut self, lower: f64, upper: f64) {
        self.s_bounds = (lower, upper);
    }

    pub fn set_first_order_bounds(&mut self, lower: f64, upper: f64) {
        self.ds_bounds = (lower, upper);
    }

    pub fn set_second_order_bounds(&mut self, lower: f64, upper: f64) {
        self.dds_bounds = (lower, upper);
    }

    pub fn set_third_order_bound(&mut self, bound: f64) {
        self.jerk_bound = bound.abs();
    }

    pub fn set_desire_derivative(&mut self, desire: f64) {
        self.desire_derivative = desire;
    }

    pub fn set_zero_order_reference(&mut self, reference: Vec<f64>) {
        self.s_ref = reference;
    }

    pub fn x(&self) -> Vec<f64> {
        self.solution_s.clone()
    }

    pub fn x_derivative(&self) -> Vec<f64> {
        self.solution_ds.clone()
    }

    pub fn x_second_order_derivative(&self) -> Vec<f64> {
        self.solution_dds.clone()
    }

    /// Solve the QP. Returns false when the problem is too small to carry
    /// the pinned endpoints, the reduced system is not positive definite,
    /// or derivative bounds cannot be met.
    pub fn optimize(&mut self) -> bool {
        let n = self.n;
        if n < 6 {
            debug!("piecewise jerk problem too small: n = {}", n);
            return false;
        }
        if self.s_ref.len() != n {
            debug!(
                "reference length {} does not match problem size {}",
                self.s_ref.len(),
                n
            );
            return false;
        }
        let dt = self.dt;
        let [w_s, w_v, w_a, w_j, w_ref] = self.weights;

        // ds = D1 s + e1, dds = D2 s + e2, jerk = D3 s + e3
        let mut d1 = DMatrix::<f64>::zeros(n, n);
        let mut e1 = DVector::<f64>::zeros(n);
        for i in 0..n - 1 {
            d1[(i, i)] = -1.0 / dt;
            d1[(i, i + 1)] = 1.0 / dt;
        }
        e1[n - 1] = self.end_s[1];

        let mut d2 = DMatrix::<f64>::zeros(n, n);
        let mut e2 = DVector::<f64>::zeros(n);
        for i in 0..n - 1 {
            for j in 0..n {
                d2[(i, j)] = (d1[(i + 1, j)] - d1[(i, j)]) / dt;
            }
            e2[i] = (e1[i + 1] - e1[i]) / dt;
        }
        e2[n - 1] = self.end_s[2];

        let mut d3 = DMatrix::<f64>::zeros(n - 1, n);
        let mut e3 = DVector::<f64>::zeros(n - 1);
        for i in 0..n - 1 {
            for j in 0..n {
                d3[(i, j)] = (d2[(i + 1, j)] - d2[(i, j)]) / dt;
            }
            e3[i] = (e2[i + 1] - e2[i]) / dt;
        }

        let h = DMatrix::<f64>::identity(n, n) * (w_s + w_ref)
            + d1.tr_mul(&d1) * w_v
            + d2.tr_mul(&d2) * w_a
            + d3.tr_mul(&d3) * w_j;
        let desire = DVector::from_element(n, self.desire_derivative);
        let s_ref = DVector::from_vec(self.s_ref.clone());
        let g = &s_ref * w_ref + d1.transpose() * (&desire - &e1) * w_v
            - d2.transpose() * &e2 * w_a
            - d3.transpose() * &e3 * w_j;

        // Endpoint pins: the init triple fixes s0..s2, the end triple
        // fixes the last two coordinates (terminal ds and dds are carried
        // by the difference model).
        let s0 = self.init_s[0];
        let s1 = s0 + dt * self.init_s[1];
        let s2 = 2.0 * s1 - s0 + dt * dt * self.init_s[2];
        let pinned: Vec<(usize, f64)> = vec![
            (0, s0),
            (1, s1),
            (2, s2),
            (n - 2, self.end_s[0] - dt * self.end_s[1]),
            (n - 1, self.end_s[0]),
        ];
        for &(_, value) in &pinned {
            if value < self.s_bounds.0 - 1e-9 || value > self.s_bounds.1 + 1e-9 {
                debug!("pinned position {} outside bounds", value);
                return false;
            }
        }
        let free: Vec<usize> = (3..n - 2).collect();

        let nf = free.len();
        let mut h_ff = DMatrix::<f64>::zeros(nf, nf);
        for (a, &i) in free.iter().enumerate() {
            for (b, &j) in free.iter().enumerate() {
                h_ff[(a, b)] = h[(i, j)];
            }
        }
        let mut rhs = DVector::<f64>::zeros(nf);
        for (a, &i) in free.iter().enumerate() {
            let fixed_part: f64 = pinned.iter().map(|&(j, v)| h[(i, j)] * v).sum();
            rhs[a] = g[i] - fixed_part;
        }

        // Penalized constraints discovered so far, keyed by (order, row);
        // the target is always the violated bound.
        let mut penalized: HashMap<(u8, usize), f64> = HashMap::new();
        let mut mu = 1e3 * (1.0 + w_s + w_v + w_a + w_j + w_ref);

        for _round in 0..MAX_PENALTY_ROUNDS {
            let mut h_work = h_ff.clone();
            let mut rhs_work = rhs.clone();
            for (&(order, row), &target) in &penalized {
                let (coeffs, offset) =
                    constraint_row(order, row, n, &d1, &e1, &d2, &e2, &d3, &e3);
                let fixed_part: f64 = pinned.iter().map(|&(j, v)| coeffs[j] * v).sum();
                for (a, &i) in free.iter().enumerate() {
                    if coeffs[i] == 0.0 {
                        continue;
                    }
                    for (b, &j) in free.iter().enumerate() {
                        h_work[(a, b)] += mu * coeffs[i] * coeffs[j];
                    }
                    rhs_work[a] += mu * (target - offset - fixed_part) * coeffs[i];
                }
            }

            let Some(chol) = h_work.cholesky() else {
                debug!("piecewise jerk reduced system not positive definite");
                return false;
            };
            let z = chol.solve(&rhs_work);

            let mut s = DVector::<f64>::zeros(n);
            for &(i, v) in &pinned {
                s[i] = v;
            }
            for (a, &i) in free.iter().enumerate() {
                s[i] = z[a];
            }

            let ds = &d1 * &s + &e1;
            let dds = &d2 * &s + &e2;
            let jerk = &d3 * &s + &e3;

            let mut worst = 0.0_f64;
            let mut record = |order: u8, row: usize, value: f64, lo: f64, hi: f64| {
                let tol = 1e-4 * (1.0 + lo.abs().min(hi.abs()));
                if value < lo - tol || value > hi + tol {
                    worst = worst.max((value - hi).max(lo - value));
                    let target = if value > hi { hi } else { lo };
                    penalized.insert((order, row), target);
                }
            };
            for i in 0..n {
                record(0, i, s[i], self.s_bounds.0, self.s_bounds.1);
                record(1, i, ds[i], self.ds_bounds.0, self.ds_bounds.1);
                record(2, i, dds[i], self.dds_bounds.0, self.dds_bounds.1);
            }
            for i in 0..n - 1 {
                record(3, i, jerk[i], -self.jerk_bound, self.jerk_bound);
            }

            if worst == 0.0 {
                self.solution_s = s.iter().copied().collect();
                self.solution_ds = ds.iter().copied().collect();
                self.solution_dds = dds.iter().copied().collect();
                return true;
            }
            mu *= 10.0;
        }
        debug!("piecewise jerk bound violations persist after penalty rounds");
        false
    }
}

/// Dense coefficient row and affine offset of one bounded quantity
fn constraint_row(
    order: u8,
    row: usize,
    n: usize,
    d1: &DMatrix<f64>,
    e1: &DVector<f64>,
    d2: &DMatrix<f64>,
    e2: &DVector<f64>,
    d3: &DMatrix<f64>,
    e3: &DVector<f64>,
) -> (Vec<f64>, f64) {
    let mut coeffs = vec![0.0; n];
    let offset;
    match order {
        0 => {
            coeffs[row] = 1.0;
            offset = 0.0;
        }
        1 => {
            for j in 0..n {
                coeffs[j] = d1[(row, j)];
            }
            offset = e1[row];
        }
        2 => {
            for j in 0..n {
                coeffs[j] = d2[(row, j)];
            }
            offset = e2[row];
        }
        _ => {
            for j in 0..n {
                coeffs[j] = d3[(row, j)];
            }
            offset = e3[row];
        }
    }
    (coeffs, offset)
}
