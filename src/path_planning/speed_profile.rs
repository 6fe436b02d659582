//! Time parameterization of the reconstructed path
//!
//! Lifts the spatial pose sequence to a timed trajectory, either by
//! finite-differencing positions at the nominal sample period or by
//! solving a piecewise-jerk QP over longitudinal position and reading
//! velocity and acceleration off the optimized profile.

use log::{debug, warn};

use crate::common::error::{PlanningError, PlanningResult};
use crate::optimization::piecewise_jerk::PathTimeQpProblem;

use super::hybrid_astar::{PlannerConfig, Trajectory};

/// Weights of the piecewise-jerk speed objective:
/// position, velocity, acceleration, jerk, and reference tracking
#[derive(Debug, Clone)]
pub struct SCurveConfig {
    pub s_weight: f64,
    pub velocity_weight: f64,
    pub acc_weight: f64,
    pub jerk_weight: f64,
    pub ref_weight: f64,
}

impl Default for SCurveConfig {
    fn default() -> Self {
        Self {
            s_weight: 0.0,
            velocity_weight: 0.0,
            acc_weight: 1.0,
            jerk_weight: 1.0,
            ref_weight: 100.0,
        }
    }
}

/// Finite-difference speed profile: v from projected position increments,
/// a from v, steering back-computed from heading increments.
pub(crate) fn generate_speed_acceleration(
    result: &mut Trajectory,
    config: &PlannerConfig,
) -> PlanningResult<()> {
    let n = result.x.len();
    if n < 2 || result.y.len() < 2 || result.phi.len() < 2 {
        return Err(PlanningError::SpeedProfileDegenerate(format!(
            "{} poses",
            n
        )));
    }
    let dt = config.delta_t;

    for i in 0..n - 1 {
        let discrete_v = ((result.x[i + 1] - result.x[i]) / dt) * result.phi[i].cos()
            + ((result.y[i + 1] - result.y[i]) / dt) * result.phi[i].sin();
        result.v.push(discrete_v);
    }
    result.v.push(0.0);

    for i in 0..n - 1 {
        result.a.push((result.v[i + 1] - result.v[i]) / dt);
    }

    load_steering(result, config);
    Ok(())
}

/// Piecewise-jerk speed profile: integrate the finite-difference
/// velocities into a reference s(t), optimize it, and overwrite v and a
/// with the optimized derivatives.
pub(crate) fn generate_s_curve_speed_acceleration(
    result: &mut Trajectory,
    config: &PlannerConfig,
) -> PlanningResult<()> {
    let n = result.x.len();
    if n < 2 || result.y.len() < 2 || result.phi.len() < 2 {
        return Err(PlanningError::SpeedProfileDegenerate(format!(
            "{} poses",
            n
        )));
    }
    let dt = config.delta_t;

    let mut accumulated_s = 0.0;
    result.accumulated_s.push(0.0);
    result.v.push(0.0);
    for i in 0..n - 1 {
        let discrete_v = ((result.x[i + 1] - result.x[i]) / dt) * result.phi[i].cos()
            + ((result.y[i + 1] - result.y[i]) / dt) * result.phi[i].sin();
        accumulated_s += discrete_v * dt;
        result.v.push(discrete_v);
        result.accumulated_s.push(accumulated_s);
    }
    result.v[n - 1] = 0.0;

    let w = [
        config.s_curve.s_weight,
        config.s_curve.velocity_weight,
        config.s_curve.acc_weight,
        config.s_curve.jerk_weight,
        config.s_curve.ref_weight,
    ];
    let init_s = [
        result.accumulated_s[0],
        result.v[0],
        (result.v[1] - result.v[0]) / dt,
    ];
    let end_s = [result.accumulated_s[n - 1], 0.0, 0.0];

    let s_min = result
        .accumulated_s
        .iter()
        .fold(f64::INFINITY, |a, &b| a.min(b));
    let s_max = result
        .accumulated_s
        .iter()
        .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let v_min = result.v.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let v_max = result.v.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    let mut path_time_qp = PathTimeQpProblem::new();
    path_time_qp.init_problem(n, dt, w, init_s, end_s);
    path_time_qp.set_zero_order_bounds(s_min - 10.0, s_max + 10.0);
    path_time_qp.set_first_order_bounds(v_min - 10.0, v_max + 10.0);
    path_time_qp.set_second_order_bounds(-4.4, 10.0);
    path_time_qp.set_third_order_bound(config.longitudinal_jerk_bound);
    path_time_qp.set_desire_derivative(0.0);
    path_time_qp.set_zero_order_reference(result.accumulated_s.clone());

    if !path_time_qp.optimize() {
        warn!("piecewise jerk speed optimizer failed");
        return Err(PlanningError::QpInfeasible(format!(
            "{} points over dt {}",
            n, dt
        )));
    }
    debug!("piecewise jerk speed optimizer succeeded over {} points", n);

    result.accumulated_s = path_time_qp.x();
    result.v = path_time_qp.x_derivative();
    result.a = path_time_qp.x_second_order_derivative();
    result.a.pop();

    load_steering(result, config);
    Ok(())
}

fn load_steering(result: &mut Trajectory, config: &PlannerConfig) {
    let n = result.x.len();
    for i in 0..n - 1 {
        let discrete_steer = (result.phi[i + 1] - result.phi[i]) * config.vehicle.wheel_base
            / config.step_size;
        let steer = if result.v[i] > 0.0 {
            discrete_steer.atan()
        } else {
            (-discrete_steer).atan()
        };
        result.steer.push(steer);
    }
}
