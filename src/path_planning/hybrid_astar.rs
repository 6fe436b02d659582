//! Hybrid A* search over a discretized SE(2) lattice
//!
//! Successors are generated by forward-simulating a bicycle model under a
//! finite set of steering primitives (forward and reverse). The search is
//! guided by an obstacle-aware 2-D cost-to-go field and short-circuited by
//! analytic Reeds-Shepp expansions toward the goal. The resulting path is
//! lifted to a timed trajectory by the speed-profile stage.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use log::debug;

use crate::common::error::{PlanningError, PlanningResult};
use crate::common::geometry::LineSegment2d;
use crate::common::types::{AreaBounds, Point2D, Pose2D};

use super::grid_search::GridSearch;
use super::motion_model::{bicycle_step, normalize_angle, VehicleParam};
use super::node3d::{GridIndex, Node3d};
use super::reeds_shepp::ReedsShepp;
use super::speed_profile::{self, SCurveConfig};

/// Configuration for the Hybrid A* planner
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Vehicle kinematics and footprint
    pub vehicle: VehicleParam,
    /// Successors per expansion, split evenly between forward and
    /// reverse; must be even
    pub next_node_num: usize,
    /// Arc length of one integration sub-step [m]
    pub step_size: f64,
    /// Lattice cell side [m]
    pub xy_grid_resolution: f64,
    /// Heading bucket width of the lattice index [rad]
    pub phi_grid_resolution: f64,
    /// Nominal time per pose sample [s]
    pub delta_t: f64,
    pub traj_forward_penalty: f64,
    pub traj_back_penalty: f64,
    pub traj_gear_switch_penalty: f64,
    pub traj_steer_penalty: f64,
    pub traj_steer_change_penalty: f64,
    /// Use the piecewise-jerk QP instead of finite differencing
    pub use_s_curve_speed_smooth: bool,
    /// Jerk bound of the QP speed profile [m/s^3]
    pub longitudinal_jerk_bound: f64,
    pub s_curve: SCurveConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            vehicle: VehicleParam::default(),
            next_node_num: 10,
            step_size: 0.5,
            xy_grid_resolution: 0.3,
            phi_grid_resolution: 0.1,
            delta_t: 0.5,
            traj_forward_penalty: 1.0,
            traj_back_penalty: 1.5,
            traj_gear_switch_penalty: 10.0,
            traj_steer_penalty: 0.5,
            traj_steer_change_penalty: 1.0,
            use_s_curve_speed_smooth: false,
            longitudinal_jerk_bound: 4.0,
            s_curve: SCurveConfig::default(),
        }
    }
}

/// Time-parameterized planning result.
///
/// The pose arrays have N entries, `v` has N, `a` and `steer` have N - 1.
/// `accumulated_s` is filled only by the QP speed profile.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub phi: Vec<f64>,
    pub v: Vec<f64>,
    pub a: Vec<f64>,
    pub steer: Vec<f64>,
    pub accumulated_s: Vec<f64>,
}

/// Priority queue entry: lattice index keyed by f = g + h, ties broken
/// by insertion order. Entries are never updated in place; stale entries
/// are discarded on pop by a lookup into the open map.
#[derive(Debug)]
struct OpenEntry {
    index: GridIndex,
    cost: f64,
    seq: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Kinodynamic warm-start planner for car-like vehicles
pub struct HybridAStarPlanner {
    config: PlannerConfig,
    reeds_shepp: ReedsShepp,
}

impl HybridAStarPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        let reeds_shepp = ReedsShepp::new(
            config.vehicle.min_turning_radius(),
            config.step_size,
        );
        Self { config, reeds_shepp }
    }

    pub fn with_defaults() -> Self {
        Self::new(PlannerConfig::default())
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan a collision-free, kinematically feasible trajectory from
    /// `start` to `goal`.
    ///
    /// Obstacles are ordered polygon vertex lists; each consecutive vertex
    /// pair contributes one edge segment (closing the ring is the
    /// caller's responsibility).
    pub fn plan(
        &self,
        start: Pose2D,
        goal: Pose2D,
        bounds: &AreaBounds,
        obstacle_polygons: &[Vec<Point2D>],
    ) -> PlanningResult<Trajectory> {
        let start = Pose2D::new(start.x, start.y, normalize_angle(start.phi));
        let goal = Pose2D::new(goal.x, goal.y, normalize_angle(goal.phi));

        let obstacle_segments: Vec<Vec<LineSegment2d>> = obstacle_polygons
            .iter()
            .map(|vertices| {
                vertices
                    .windows(2)
                    .map(|pair| LineSegment2d::new(pair[0], pair[1]))
                    .collect()
            })
            .collect();

        let xy_resolution = self.config.xy_grid_resolution;
        let phi_resolution = self.config.phi_grid_resolution;

        let start_node = Node3d::from_pose(&start, bounds, xy_resolution, phi_resolution);
        if !self.validity_check(&start_node, bounds, &obstacle_segments) {
            debug!("start node in collision with obstacles");
            return Err(PlanningError::StartInCollision);
        }
        let goal_node = Node3d::from_pose(&goal, bounds, xy_resolution, phi_resolution);
        if !self.validity_check(&goal_node, bounds, &obstacle_segments) {
            debug!("goal node in collision with obstacles");
            return Err(PlanningError::GoalInCollision);
        }

        let map_start = Instant::now();
        let mut grid = GridSearch::new(xy_resolution);
        grid.generate_dp_map(goal.x, goal.y, bounds, &obstacle_segments);
        debug!("dp map generated in {:?}", map_start.elapsed());

        let mut arena: Vec<Node3d> = Vec::new();
        let mut open_set: HashMap<GridIndex, usize> = HashMap::new();
        let mut close_set: HashMap<GridIndex, usize> = HashMap::new();
        let mut open_pq: BinaryHeap<OpenEntry> = BinaryHeap::new();
        let mut seq = 0u64;

        arena.push(start_node);
        open_set.insert(arena[0].index(), 0);
        open_pq.push(OpenEntry {
            index: arena[0].index(),
            cost: arena[0].cost(),
            seq,
        });
        seq += 1;

        let search_start = Instant::now();
        let mut explored_node_num = 0usize;
        let mut final_handle: Option<usize> = None;

        while let Some(entry) = open_pq.pop() {
            // Stale entries point at cells no longer open
            let Some(&current_handle) = open_set.get(&entry.index) else {
                continue;
            };

            let expansion =
                self.analytic_expansion(&arena[current_handle], &goal, bounds, &obstacle_segments);
            if let Some(mut rs_node) = expansion {
                rs_node.set_pre(current_handle);
                arena.push(rs_node);
                let handle = arena.len() - 1;
                close_set.insert(arena[handle].index(), handle);
                final_handle = Some(handle);
                break;
            }

            open_set.remove(&entry.index);
            close_set.insert(entry.index, current_handle);

            for next_index in 0..self.config.next_node_num {
                let Some(mut next_node) =
                    self.next_node(&arena[current_handle], next_index, bounds)
                else {
                    continue;
                };
                if close_set.contains_key(&next_node.index()) {
                    continue;
                }
                if !self.validity_check(&next_node, bounds, &obstacle_segments) {
                    continue;
                }
                // First path into a cell wins; nodes already open are
                // left untouched
                if !open_set.contains_key(&next_node.index()) {
                    explored_node_num += 1;
                    self.calculate_node_cost(&arena[current_handle], &mut next_node, &grid);
                    next_node.set_pre(current_handle);
                    let index = next_node.index();
                    let cost = next_node.cost();
                    arena.push(next_node);
                    open_set.insert(index, arena.len() - 1);
                    open_pq.push(OpenEntry { index, cost, seq });
                    seq += 1;
                }
            }
        }

        let Some(final_handle) = final_handle else {
            debug!(
                "open set ran out after exploring {} nodes",
                explored_node_num
            );
            return Err(PlanningError::OpenSetExhausted);
        };
        debug!(
            "explored {} nodes in {:?}",
            explored_node_num,
            search_start.elapsed()
        );

        let (x, y, phi) = self.reconstruct(&arena, final_handle);
        let mut result = Trajectory {
            x,
            y,
            phi,
            v: Vec::new(),
            a: Vec::new(),
            steer: Vec::new(),
            accumulated_s: Vec::new(),
        };

        if self.config.use_s_curve_speed_smooth {
            speed_profile::generate_s_curve_speed_acceleration(&mut result, &self.config)?;
        } else {
            speed_profile::generate_speed_acceleration(&mut result, &self.config)?;
        }

        if result.x.len() != result.y.len()
            || result.x.len() != result.phi.len()
            || result.x.len() != result.v.len()
        {
            return Err(PlanningError::SizeInvariantViolated(format!(
                "x {} y {} phi {} v {}",
                result.x.len(),
                result.y.len(),
                result.phi.len(),
                result.v.len()
            )));
        }
        if result.a.len() != result.steer.len() || result.x.len() != result.a.len() + 1 {
            return Err(PlanningError::SizeInvariantViolated(format!(
                "x {} a {} steer {}",
                result.x.len(),
                result.a.len(),
                result.steer.len()
            )));
        }
        Ok(result)
    }

    /// Every pose on the node's micro-path except the first (the parent's
    /// already-validated final pose) must be inside the workspace with a
    /// footprint clear of every obstacle edge. Single-pose nodes check
    /// their one pose.
    fn validity_check(
        &self,
        node: &Node3d,
        bounds: &AreaBounds,
        obstacle_segments: &[Vec<LineSegment2d>],
    ) -> bool {
        let pose_count = node.step_size();
        let first_check = if pose_count == 1 { 0 } else { 1 };
        for i in first_check..pose_count {
            let x = node.xs()[i];
            let y = node.ys()[i];
            let phi = node.phis()[i];
            if !bounds.contains(x, y) {
                return false;
            }
            let footprint = Node3d::bounding_box(&self.config.vehicle, x, y, phi);
            for segments in obstacle_segments {
                for segment in segments {
                    if footprint.has_overlap(segment) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Try to connect the current node to the goal with a Reeds-Shepp
    /// curve. Returns the synthesized terminal node when the curve exists
    /// and is collision-free.
    fn analytic_expansion(
        &self,
        current: &Node3d,
        goal: &Pose2D,
        bounds: &AreaBounds,
        obstacle_segments: &[Vec<LineSegment2d>],
    ) -> Option<Node3d> {
        let from = Pose2D::new(current.x(), current.y(), current.phi());
        let rs_path = self.reeds_shepp.shortest_rsp(&from, goal)?;

        let mut rs_node = Node3d::new(
            rs_path.x,
            rs_path.y,
            rs_path.phi,
            bounds,
            self.config.xy_grid_resolution,
            self.config.phi_grid_resolution,
        );
        if !self.validity_check(&rs_node, bounds, obstacle_segments) {
            return None;
        }
        rs_node.set_traj_cost(
            current.traj_cost() + rs_path.total_length * self.config.traj_forward_penalty,
        );
        Some(rs_node)
    }

    /// One motion primitive: constant steering and direction integrated
    /// over a full lattice cell diagonal. Returns `None` when the final
    /// pose leaves the workspace.
    fn next_node(
        &self,
        current: &Node3d,
        next_index: usize,
        bounds: &AreaBounds,
    ) -> Option<Node3d> {
        let max_wheel_angle = self.config.vehicle.max_wheel_angle();
        let half = self.config.next_node_num / 2;
        let steer_step = 2.0 * max_wheel_angle / (half as f64 - 1.0);
        let (steering, traveled) = if next_index < half {
            (
                -max_wheel_angle + steer_step * next_index as f64,
                self.config.step_size,
            )
        } else {
            (
                -max_wheel_angle + steer_step * (next_index - half) as f64,
                -self.config.step_size,
            )
        };

        let arc = std::f64::consts::SQRT_2 * self.config.xy_grid_resolution;
        let mut xs = vec![current.x()];
        let mut ys = vec![current.y()];
        let mut phis = vec![current.phi()];
        let (mut x, mut y, mut phi) = (current.x(), current.y(), current.phi());
        let mut i = 0usize;
        while (i as f64) < arc / self.config.step_size {
            let (next_x, next_y, next_phi) = bicycle_step(
                x,
                y,
                phi,
                steering,
                traveled,
                self.config.vehicle.wheel_base,
            );
            xs.push(next_x);
            ys.push(next_y);
            phis.push(next_phi);
            x = next_x;
            y = next_y;
            phi = next_phi;
            i += 1;
        }
        if !bounds.contains(x, y) {
            return None;
        }

        let mut node = Node3d::new(
            xs,
            ys,
            phis,
            bounds,
            self.config.xy_grid_resolution,
            self.config.phi_grid_resolution,
        );
        node.set_direction(traveled > 0.0);
        node.set_steering(steering);
        Some(node)
    }

    fn calculate_node_cost(&self, current: &Node3d, next: &mut Node3d, grid: &GridSearch) {
        let traj_cost = current.traj_cost() + self.traj_cost(current, next);
        next.set_traj_cost(traj_cost);
        next.set_heuristic_cost(grid.check_dp_map(next.x(), next.y()));
    }

    fn traj_cost(&self, current: &Node3d, next: &Node3d) -> f64 {
        let mut piecewise_cost = 0.0;
        let distance_penalty = if next.direction() {
            self.config.traj_forward_penalty
        } else {
            self.config.traj_back_penalty
        };
        piecewise_cost +=
            (next.step_size() - 1) as f64 * self.config.step_size * distance_penalty;
        if current.direction() != next.direction() {
            piecewise_cost += self.config.traj_gear_switch_penalty;
        }
        piecewise_cost += self.config.traj_steer_penalty * next.steering().abs();
        piecewise_cost +=
            self.config.traj_steer_change_penalty * (next.steering() - current.steering()).abs();
        piecewise_cost
    }

    /// Walk the parent links from the terminal node back to the start,
    /// concatenating each node's pose sweep (dropping the leading pose,
    /// which the parent provides) into one start-to-goal sequence.
    fn reconstruct(&self, arena: &[Node3d], final_handle: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut x: Vec<f64> = Vec::new();
        let mut y: Vec<f64> = Vec::new();
        let mut phi: Vec<f64> = Vec::new();

        let mut handle = final_handle;
        while let Some(pre) = arena[handle].pre() {
            let node = &arena[handle];
            let mut seg_x: Vec<f64> = node.xs().to_vec();
            let mut seg_y: Vec<f64> = node.ys().to_vec();
            let mut seg_phi: Vec<f64> = node.phis().to_vec();
            seg_x.reverse();
            seg_y.reverse();
            seg_phi.reverse();
            seg_x.pop();
            seg_y.pop();
            seg_phi.pop();
            x.extend(seg_x);
            y.extend(seg_y);
            phi.extend(seg_phi);
            handle = pre;
        }
        x.push(arena[handle].x());
        y.push(arena[handle].y());
        phi.push(arena[handle].phi());
        x.reverse();
        y.reverse();
        phi.reverse();
        (x, y, phi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn assert_result_invariants(result: &Trajectory, bounds: &AreaBounds) {
        let n = result.x.len();
        assert!(n >= 2);
        assert_eq!(result.y.len(), n);
        assert_eq!(result.phi.len(), n);
        assert_eq!(result.v.len(), n);
        assert_eq!(result.a.len(), n - 1);
        assert_eq!(result.steer.len(), n - 1);
        for i in 0..n {
            assert!(bounds.contains(result.x[i], result.y[i]));
            assert!(result.phi[i] > -PI && result.phi[i] <= PI);
        }
    }

    #[test]
    fn test_straight_shot() {
        let planner = HybridAStarPlanner::with_defaults();
        let bounds = AreaBounds::new(-1.0, 10.0, -5.0, 5.0);
        let result = planner
            .plan(
                Pose2D::new(0.0, 0.0, 0.0),
                Pose2D::new(5.0, 0.0, 0.0),
                &bounds,
                &[],
            )
            .unwrap();
        assert_result_invariants(&result, &bounds);

        let n = result.x.len();
        assert!(result.x[0].abs() < 1e-9);
        assert!(result.y[0].abs() < 1e-9);
        assert!((result.x[n - 1] - 5.0).abs() < 1e-6);
        assert!(result.y[n - 1].abs() < 1e-6);
        for i in 0..n {
            assert!(result.y[i].abs() < 1e-6);
            assert!(result.phi[i].abs() < 1e-6);
            if i > 0 {
                assert!(result.x[i] >= result.x[i - 1] - 1e-9);
            }
            assert!(result.v[i] >= -1e-9);
        }
        assert!(result.v[n - 1].abs() < 1e-12);
        assert!(result.accumulated_s.is_empty());
    }

    #[test]
    fn test_reverse_parking() {
        let planner = HybridAStarPlanner::with_defaults();
        let bounds = AreaBounds::new(-5.0, 5.0, -5.0, 5.0);
        let result = planner
            .plan(
                Pose2D::new(0.0, 0.0, 0.0),
                Pose2D::new(0.0, -2.0, 0.0),
                &bounds,
                &[],
            )
            .unwrap();
        assert_result_invariants(&result, &bounds);

        let n = result.x.len();
        assert!(result.x[n - 1].abs() < 1e-6);
        assert!((result.y[n - 1] + 2.0).abs() < 1e-6);
        assert!(result.phi[n - 1].abs() < 1e-6);

        let has_forward = result.v.iter().any(|&v| v > 1e-6);
        let has_reverse = result.v.iter().any(|&v| v < -1e-6);
        let phi_excursion = result.phi.iter().fold(0.0_f64, |acc, &p| acc.max(p.abs()));
        assert!((has_forward && has_reverse) || phi_excursion > 0.1);
    }

    #[test]
    fn test_corridor() {
        let planner = HybridAStarPlanner::with_defaults();
        let bounds = AreaBounds::new(-2.0, 12.0, -3.0, 3.0);
        // Two walls at y = +/-1, each with a 2-unit opening around x = 5
        let obstacles = vec![
            vec![Point2D::new(-2.0, 1.0), Point2D::new(4.0, 1.0)],
            vec![Point2D::new(6.0, 1.0), Point2D::new(12.0, 1.0)],
            vec![Point2D::new(-2.0, -1.0), Point2D::new(4.0, -1.0)],
            vec![Point2D::new(6.0, -1.0), Point2D::new(12.0, -1.0)],
        ];
        let result = planner
            .plan(
                Pose2D::new(0.0, 0.0, 0.0),
                Pose2D::new(10.0, 0.0, 0.0),
                &bounds,
                &obstacles,
            )
            .unwrap();
        assert_result_invariants(&result, &bounds);
        for i in 0..result.x.len() {
            if result.x[i] > -1.0 && result.x[i] < 11.0 {
                assert!(result.y[i].abs() < 1.0);
            }
        }
    }

    #[test]
    fn test_infeasible_goal() {
        let config = PlannerConfig {
            vehicle: VehicleParam {
                wheel_base: 0.15,
                max_steer_angle: 6.0,
                steer_ratio: 10.0,
                length: 0.2,
                width: 0.2,
                back_edge_to_center: 0.05,
            },
            ..PlannerConfig::default()
        };
        let planner = HybridAStarPlanner::new(config);
        let bounds = AreaBounds::new(-5.0, 5.0, -5.0, 5.0);
        // Closed square containing the goal but clear of the start footprint
        let enclosure = vec![
            Point2D::new(0.16, -0.04),
            Point2D::new(0.24, -0.04),
            Point2D::new(0.24, 0.04),
            Point2D::new(0.16, 0.04),
            Point2D::new(0.16, -0.04),
        ];
        let err = planner
            .plan(
                Pose2D::new(0.0, 0.0, 0.0),
                Pose2D::new(0.2, 0.0, 0.0),
                &bounds,
                &[enclosure],
            )
            .unwrap_err();
        assert!(matches!(err, PlanningError::GoalInCollision));
    }

    #[test]
    fn test_start_out_of_bounds() {
        let planner = HybridAStarPlanner::with_defaults();
        let bounds = AreaBounds::new(-1.0, 10.0, -5.0, 5.0);
        let err = planner
            .plan(
                Pose2D::new(-2.0, 0.0, 0.0),
                Pose2D::new(5.0, 0.0, 0.0),
                &bounds,
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, PlanningError::StartInCollision));
    }

    #[test]
    fn test_open_set_exhausted_in_sealed_enclosure() {
        let planner = HybridAStarPlanner::with_defaults();
        let bounds = AreaBounds::new(-3.0, 3.0, -3.0, 3.0);
        let enclosure = vec![
            Point2D::new(-1.5, -1.5),
            Point2D::new(1.5, -1.5),
            Point2D::new(1.5, 1.5),
            Point2D::new(-1.5, 1.5),
            Point2D::new(-1.5, -1.5),
        ];
        let err = planner
            .plan(
                Pose2D::new(0.0, 0.0, 0.0),
                Pose2D::new(2.5, 0.0, 0.0),
                &bounds,
                &[enclosure],
            )
            .unwrap_err();
        assert!(matches!(err, PlanningError::OpenSetExhausted));
    }

    #[test]
    fn test_detour_around_wall() {
        let planner = HybridAStarPlanner::with_defaults();
        let bounds = AreaBounds::new(-1.0, 7.0, -3.0, 3.0);
        // Wall leaves a gap along the top of the workspace
        let wall = vec![Point2D::new(3.0, -3.0), Point2D::new(3.0, 0.5)];
        let result = planner
            .plan(
                Pose2D::new(0.0, 0.0, 0.0),
                Pose2D::new(5.5, 0.0, 0.0),
                &bounds,
                &[wall.clone()],
            )
            .unwrap();
        assert_result_invariants(&result, &bounds);

        let n = result.x.len();
        assert!(result.x[0].abs() < 1e-9);
        assert!((result.x[n - 1] - 5.5).abs() < 1e-6);
        assert!(result.y[n - 1].abs() < 1e-6);

        let segment = LineSegment2d::new(wall[0], wall[1]);
        for i in 1..n {
            let footprint = Node3d::bounding_box(
                &planner.config.vehicle,
                result.x[i],
                result.y[i],
                result.phi[i],
            );
            assert!(!footprint.has_overlap(&segment));
        }
    }

    #[test]
    fn test_branching_parity() {
        let planner = HybridAStarPlanner::with_defaults();
        let bounds = AreaBounds::new(-10.0, 10.0, -10.0, 10.0);
        let start = Node3d::from_pose(&Pose2D::origin(), &bounds, 0.3, 0.1);

        let nodes: Vec<Node3d> = (0..planner.config.next_node_num)
            .filter_map(|i| planner.next_node(&start, i, &bounds))
            .collect();
        assert_eq!(nodes.len(), 10);

        let mut forward_steers: Vec<f64> = nodes
            .iter()
            .filter(|n| n.direction())
            .map(|n| n.steering())
            .collect();
        let mut reverse_steers: Vec<f64> = nodes
            .iter()
            .filter(|n| !n.direction())
            .map(|n| n.steering())
            .collect();
        assert_eq!(forward_steers.len(), 5);
        assert_eq!(reverse_steers.len(), 5);

        forward_steers.sort_by(|a, b| a.partial_cmp(b).unwrap());
        reverse_steers.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let max_wheel_angle = planner.config.vehicle.max_wheel_angle();
        assert!((forward_steers[0] + max_wheel_angle).abs() < 1e-9);
        assert!((forward_steers[4] - max_wheel_angle).abs() < 1e-9);
        for i in 0..5 {
            // Symmetric around zero, identical for both gears
            assert!((forward_steers[i] + forward_steers[4 - i]).abs() < 1e-9);
            assert!((forward_steers[i] - reverse_steers[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_heuristic_lower_bounds_trajectory_length() {
        use rand::Rng;

        let planner = HybridAStarPlanner::with_defaults();
        let bounds = AreaBounds::new(-10.0, 10.0, -10.0, 10.0);
        let goal = Pose2D::origin();
        let mut grid = GridSearch::new(planner.config.xy_grid_resolution);
        grid.generate_dp_map(goal.x, goal.y, &bounds, &[]);

        // Start headings perpendicular to the goal direction force the
        // analytic curve well above the holonomic field value
        let mut rng = rand::thread_rng();
        let poses = [
            (5.1, 0.1, FRAC_PI_2),
            (0.1, -6.1, 0.0),
            (4.1, 4.1, -FRAC_PI_4),
            (-6.1, 0.1, FRAC_PI_2),
        ];
        for (x0, y0, phi0) in poses {
            let start = Pose2D::new(
                x0 + rng.gen_range(-0.1..0.1),
                y0 + rng.gen_range(-0.1..0.1),
                phi0,
            );
            let result = planner.plan(start, goal, &bounds, &[]).unwrap();
            let mut length = 0.0;
            for i in 0..result.x.len() - 1 {
                let dx = result.x[i + 1] - result.x[i];
                let dy = result.y[i + 1] - result.y[i];
                length += (dx * dx + dy * dy).sqrt();
            }
            let heuristic = grid.check_dp_map(start.x, start.y);
            assert!(
                heuristic <= length + 1e-6,
                "heuristic {} exceeds trajectory length {}",
                heuristic,
                length
            );
        }
    }

    #[test]
    fn test_successor_g_cost_monotone() {
        let planner = HybridAStarPlanner::with_defaults();
        let bounds = AreaBounds::new(-10.0, 10.0, -10.0, 10.0);
        let mut grid = GridSearch::new(planner.config.xy_grid_resolution);
        grid.generate_dp_map(5.0, 0.0, &bounds, &[]);

        let start = Node3d::from_pose(&Pose2D::origin(), &bounds, 0.3, 0.1);
        for i in 0..planner.config.next_node_num {
            let mut next = planner.next_node(&start, i, &bounds).unwrap();
            planner.calculate_node_cost(&start, &mut next, &grid);
            assert!(next.traj_cost() > start.traj_cost());
        }
    }

    #[test]
    fn test_straight_shot_with_qp_speed_profile() {
        let config = PlannerConfig {
            use_s_curve_speed_smooth: true,
            ..PlannerConfig::default()
        };
        let planner = HybridAStarPlanner::new(config);
        let bounds = AreaBounds::new(-1.0, 10.0, -5.0, 5.0);
        let result = planner
            .plan(
                Pose2D::new(0.0, 0.0, 0.0),
                Pose2D::new(5.0, 0.0, 0.0),
                &bounds,
                &[],
            )
            .unwrap();
        assert_result_invariants(&result, &bounds);
        let n = result.x.len();
        assert_eq!(result.accumulated_s.len(), n);
        assert!(result.v[0].abs() < 1e-9);
        assert!(result.v[n - 1].abs() < 1e-9);
        assert!(result.accumulated_s[0].abs() < 1e-9);
    }
}
