//! Reeds-Shepp shortest paths for a car with bounded turning radius
//!
//! Enumerates the canonical curve-word families (straight and
//! minimum-radius arc segments, forwards and backwards) between two
//! SE(2) poses, keeps the shortest feasible candidate, and densifies it
//! to pose samples with per-sample gear flags.
//!
//! Segment-length formulas follow:
//! - Reeds & Shepp, "Optimal paths for a car that goes both forwards
//!   and backwards", Pacific J. Math. 145 (1990)

use std::cmp::Ordering;
use std::f64::consts::PI;

use crate::common::types::Pose2D;

use super::motion_model::normalize_angle;

/// Densified Reeds-Shepp path between two poses.
///
/// `gears[i]` is true when sample `i` lies on a forward segment. Gear
/// changes occur only at segment boundaries.
#[derive(Debug, Clone)]
pub struct ReedsSheppPath {
    /// Signed metric segment lengths (negative = reverse)
    pub segment_lengths: Vec<f64>,
    /// Segment curve types, one of 'L', 'S', 'R'
    pub segment_types: Vec<char>,
    /// Sum of unsigned segment lengths [m]
    pub total_length: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub phi: Vec<f64>,
    pub gears: Vec<bool>,
}

/// Candidate word with normalized (unit turning radius) segment lengths
#[derive(Debug, Clone)]
struct RspParam {
    lengths: Vec<f64>,
    ctypes: Vec<char>,
    total: f64,
}

/// Reeds-Shepp shortest-path generator
pub struct ReedsShepp {
    max_kappa: f64,
    step_size: f64,
}

impl ReedsShepp {
    pub fn new(turning_radius: f64, step_size: f64) -> Self {
        Self {
            max_kappa: 1.0 / turning_radius,
            step_size,
        }
    }

    /// Shortest kinematically feasible path from `from` to `to`, or `None`
    /// when every candidate word is geometrically infeasible.
    pub fn shortest_rsp(&self, from: &Pose2D, to: &Pose2D) -> Option<ReedsSheppPath> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let dphi = to.phi - from.phi;
        let c = from.phi.cos();
        let s = from.phi.sin();
        // Normalized target frame: start at the origin, unit turning radius
        let x = (c * dx + s * dy) * self.max_kappa;
        let y = (-s * dx + c * dy) * self.max_kappa;

        let candidates = generate_candidates(x, y, dphi);
        let best = candidates
            .into_iter()
            .min_by(|a, b| a.total.partial_cmp(&b.total).unwrap_or(Ordering::Equal))?;
        Some(self.densify(&best, from))
    }

    /// Sample the winning word at the configured step size and map the
    /// local course back into the global frame.
    fn densify(&self, param: &RspParam, from: &Pose2D) -> ReedsSheppPath {
        let step = self.step_size * self.max_kappa;

        let mut local_x: Vec<f64> = Vec::new();
        let mut local_y: Vec<f64> = Vec::new();
        let mut local_phi: Vec<f64> = Vec::new();
        let mut gears: Vec<bool> = Vec::new();

        let mut origin_x = 0.0;
        let mut origin_y = 0.0;
        let mut origin_phi = 0.0;

        for (&length, &ctype) in param.lengths.iter().zip(param.ctypes.iter()) {
            if length.abs() < 1e-10 {
                continue;
            }
            for dist in interpolate_dists(length, step) {
                let (px, py, pphi) =
                    interpolate(dist, ctype, self.max_kappa, origin_x, origin_y, origin_phi);
                local_x.push(px);
                local_y.push(py);
                local_phi.push(pphi);
                gears.push(length > 0.0);
            }
            origin_x = *local_x.last().unwrap();
            origin_y = *local_y.last().unwrap();
            origin_phi = *local_phi.last().unwrap();
        }
        if local_x.is_empty() {
            // Degenerate zero-length query collapses to the start pose
            local_x.push(0.0);
            local_y.push(0.0);
            local_phi.push(0.0);
            gears.push(true);
        }

        let cos0 = from.phi.cos();
        let sin0 = from.phi.sin();
        let x = local_x
            .iter()
            .zip(local_y.iter())
            .map(|(&lx, &ly)| cos0 * lx - sin0 * ly + from.x)
            .collect();
        let y = local_x
            .iter()
            .zip(local_y.iter())
            .map(|(&lx, &ly)| sin0 * lx + cos0 * ly + from.y)
            .collect();
        let phi = local_phi
            .iter()
            .map(|&p| normalize_angle(p + from.phi))
            .collect();

        ReedsSheppPath {
            segment_lengths: param.lengths.iter().map(|l| l / self.max_kappa).collect(),
            segment_types: param.ctypes.clone(),
            total_length: param.total / self.max_kappa,
            x,
            y,
            phi,
            gears,
        }
    }
}

/// Signed sample distances along one segment: every `step` plus the exact end
fn interpolate_dists(length: f64, step: f64) -> Vec<f64> {
    let d = if length >= 0.0 { step } else { -step };
    let mut dists = Vec::new();
    let mut current = 0.0;
    while (length >= 0.0 && current < length) || (length < 0.0 && current > length) {
        dists.push(current);
        current += d;
    }
    dists.push(length);
    dists
}

/// Pose at signed arc distance `dist` from a segment origin, in metric
/// local-frame coordinates
fn interpolate(
    dist: f64,
    ctype: char,
    max_kappa: f64,
    origin_x: f64,
    origin_y: f64,
    origin_phi: f64,
) -> (f64, f64, f64) {
    if ctype == 'S' {
        let x = origin_x + dist / max_kappa * origin_phi.cos();
        let y = origin_y + dist / max_kappa * origin_phi.sin();
        (x, y, origin_phi)
    } else {
        let ldx = dist.sin() / max_kappa;
        let (ldy, phi) = if ctype == 'L' {
            ((1.0 - dist.cos()) / max_kappa, origin_phi + dist)
        } else {
            ((1.0 - dist.cos()) / -max_kappa, origin_phi - dist)
        };
        let x = origin_x + origin_phi.cos() * ldx - origin_phi.sin() * ldy;
        let y = origin_y + origin_phi.sin() * ldx + origin_phi.cos() * ldy;
        (x, y, phi)
    }
}

/// All feasible candidate words for the normalized target (x, y, phi):
/// each base family under identity, timeflip, reflect, and both.
fn generate_candidates(x: f64, y: f64, phi: f64) -> Vec<RspParam> {
    type WordFn = fn(f64, f64, f64) -> Option<(Vec<f64>, Vec<char>)>;
    let word_functions: [WordFn; 12] = [
        left_straight_left,
        left_straight_right,
        left_x_right_x_left,
        left_x_right_left,
        left_right_x_left,
        left_right_x_left_right,
        left_x_right_left_x_right,
        left_x_right90_straight_left,
        left_x_right90_straight_right,
        left_straight_right90_x_left,
        left_straight_left90_x_right,
        left_x_right90_straight_left90_x_right,
    ];

    let mut candidates = Vec::new();
    for word in word_functions {
        if let Some((lengths, ctypes)) = word(x, y, phi) {
            add_candidate(&mut candidates, lengths, ctypes);
        }
        if let Some((lengths, ctypes)) = word(-x, y, -phi) {
            add_candidate(&mut candidates, timeflip(lengths), ctypes);
        }
        if let Some((lengths, ctypes)) = word(x, -y, -phi) {
            add_candidate(&mut candidates, lengths, reflect(&ctypes));
        }
        if let Some((lengths, ctypes)) = word(-x, -y, phi) {
            add_candidate(&mut candidates, timeflip(lengths), reflect(&ctypes));
        }
    }
    candidates
}

fn add_candidate(candidates: &mut Vec<RspParam>, lengths: Vec<f64>, ctypes: Vec<char>) {
    let total: f64 = lengths.iter().map(|l| l.abs()).sum();
    // The symmetry transforms reproduce some words; keep one copy
    let duplicate = candidates
        .iter()
        .any(|p| p.ctypes == ctypes && (p.total - total).abs() < 1e-9);
    if duplicate {
        return;
    }
    candidates.push(RspParam { lengths, ctypes, total });
}

fn timeflip(lengths: Vec<f64>) -> Vec<f64> {
    lengths.iter().map(|l| -l).collect()
}

fn reflect(ctypes: &[char]) -> Vec<char> {
    ctypes
        .iter()
        .map(|&c| match c {
            'L' => 'R',
            'R' => 'L',
            _ => 'S',
        })
        .collect()
}

fn polar(x: f64, y: f64) -> (f64, f64) {
    ((x * x + y * y).sqrt(), y.atan2(x))
}

fn mod2pi(x: f64) -> f64 {
    let v = x % (2.0 * PI);
    if v < -PI {
        v + 2.0 * PI
    } else if v > PI {
        v - 2.0 * PI
    } else {
        v
    }
}

fn left_straight_left(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u, t) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if (0.0..=PI).contains(&t) {
        let v = mod2pi(phi - t);
        if (0.0..=PI).contains(&v) {
            return Some((vec![t, u, v], vec!['L', 'S', 'L']));
        }
    }
    None
}

fn left_straight_right(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, t1) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    let u1_sq = u1 * u1;
    if u1_sq >= 4.0 {
        let u = (u1_sq - 4.0).sqrt();
        let theta = 2.0_f64.atan2(u);
        let t = mod2pi(t1 + theta);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, v], vec!['L', 'S', 'R']));
        }
    }
    None
}

fn left_x_right_x_left(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 <= 4.0 {
        let a = (0.25 * u1).acos();
        let t = mod2pi(a + theta + PI / 2.0);
        let u = mod2pi(PI - 2.0 * a);
        let v = mod2pi(phi - t - u);
        return Some((vec![t, -u, v], vec!['L', 'R', 'L']));
    }
    None
}

fn left_x_right_left(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 <= 4.0 {
        let a = (0.25 * u1).acos();
        let t = mod2pi(a + theta + PI / 2.0);
        let u = mod2pi(PI - 2.0 * a);
        let v = mod2pi(-phi + t + u);
        return Some((vec![t, -u, -v], vec!['L', 'R', 'L']));
    }
    None
}

fn left_right_x_left(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 <= 4.0 {
        let u = (1.0 - u1 * u1 * 0.125).acos();
        let a = (2.0 * u.sin() / u1).asin();
        let t = mod2pi(-a + theta + PI / 2.0);
        let v = mod2pi(t - u - phi);
        return Some((vec![t, u, -v], vec!['L', 'R', 'L']));
    }
    None
}

fn left_right_x_left_right(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 <= 2.0 {
        let a = ((u1 + 2.0) * 0.25).acos();
        let t = mod2pi(theta + a + PI / 2.0);
        let u = mod2pi(a);
        let v = mod2pi(phi - t + 2.0 * u);
        if t >= 0.0 && u >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, -u, -v], vec!['L', 'R', 'L', 'R']));
        }
    }
    None
}

fn left_x_right_left_x_right(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    let u2 = (20.0 - u1 * u1) / 16.0;
    if (0.0..=1.0).contains(&u2) {
        let u = u2.acos();
        let a = (2.0 * u.sin() / u1).asin();
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -u, -u, v], vec!['L', 'R', 'L', 'R']));
        }
    }
    None
}

fn left_x_right90_straight_left(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 >= 2.0 {
        let u = (u1 * u1 - 4.0).sqrt() - 2.0;
        let a = 2.0_f64.atan2((u1 * u1 - 4.0).sqrt());
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi + PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -PI / 2.0, -u, -v], vec!['L', 'R', 'S', 'L']));
        }
    }
    None
}

fn left_x_right90_straight_right(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 >= 2.0 {
        let t = mod2pi(theta + PI / 2.0);
        let u = u1 - 2.0;
        let v = mod2pi(phi - t - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -PI / 2.0, -u, -v], vec!['L', 'R', 'S', 'R']));
        }
    }
    None
}

fn left_straight_right90_x_left(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 >= 2.0 {
        let u = (u1 * u1 - 4.0).sqrt() - 2.0;
        let a = (u1 * u1 - 4.0).sqrt().atan2(2.0);
        let t = mod2pi(theta - a + PI / 2.0);
        let v = mod2pi(t - phi - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, PI / 2.0, -v], vec!['L', 'S', 'R', 'L']));
        }
    }
    None
}

fn left_straight_left90_x_right(x: f64, y: f64, phi: f64) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 >= 2.0 {
        let t = mod2pi(theta);
        let u = u1 - 2.0;
        let v = mod2pi(phi - t - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, PI / 2.0, -v], vec!['L', 'S', 'L', 'R']));
        }
    }
    None
}

fn left_x_right90_straight_left90_x_right(
    x: f64,
    y: f64,
    phi: f64,
) -> Option<(Vec<f64>, Vec<char>)> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 >= 4.0 {
        let u = (u1 * u1 - 4.0).sqrt() - 4.0;
        let a = 2.0_f64.atan2((u1 * u1 - 4.0).sqrt());
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return Some((
                vec![t, -PI / 2.0, -u, -PI / 2.0, v],
                vec!['L', 'R', 'S', 'L', 'R'],
            ));
        }
    }
    None
}
