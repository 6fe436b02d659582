//! Search node over the discretized SE(2) lattice
//!
//! A node records the swept micro-path that reached its final pose. Two
//! nodes landing in the same (x, y, heading) cell share an index and are
//! treated as the same lattice cell by the search.

use std::f64::consts::PI;

use crate::common::geometry::Box2d;
use crate::common::types::{AreaBounds, Point2D, Pose2D};

use super::motion_model::VehicleParam;

/// Discrete lattice cell key: (x cell, y cell, heading bucket)
pub type GridIndex = (i64, i64, i64);

/// One expansion of the search graph.
///
/// The pose arrays hold the intermediate poses sampled along the micro-path
/// from the parent's final pose (inclusive, as the first entry) to this
/// node's final pose (the last entry).
#[derive(Debug, Clone)]
pub struct Node3d {
    xs: Vec<f64>,
    ys: Vec<f64>,
    phis: Vec<f64>,
    x: f64,
    y: f64,
    phi: f64,
    index: GridIndex,
    traj_cost: f64,
    heuristic_cost: f64,
    steering: f64,
    direction: bool,
    pre: Option<usize>,
}

impl Node3d {
    /// Build a node from a swept pose sequence. The index is derived from
    /// the final pose and never changes afterwards.
    pub fn new(
        xs: Vec<f64>,
        ys: Vec<f64>,
        phis: Vec<f64>,
        bounds: &AreaBounds,
        xy_resolution: f64,
        phi_resolution: f64,
    ) -> Self {
        assert!(!xs.is_empty());
        assert_eq!(xs.len(), ys.len());
        assert_eq!(xs.len(), phis.len());
        let x = *xs.last().unwrap();
        let y = *ys.last().unwrap();
        let phi = *phis.last().unwrap();
        let index = Self::compute_index(x, y, phi, bounds, xy_resolution, phi_resolution);
        Self {
            xs,
            ys,
            phis,
            x,
            y,
            phi,
            index,
            traj_cost: 0.0,
            heuristic_cost: 0.0,
            steering: 0.0,
            direction: true,
            pre: None,
        }
    }

    /// Single-pose node (start and goal configurations)
    pub fn from_pose(
        pose: &Pose2D,
        bounds: &AreaBounds,
        xy_resolution: f64,
        phi_resolution: f64,
    ) -> Self {
        Self::new(
            vec![pose.x],
            vec![pose.y],
            vec![pose.phi],
            bounds,
            xy_resolution,
            phi_resolution,
        )
    }

    fn compute_index(
        x: f64,
        y: f64,
        phi: f64,
        bounds: &AreaBounds,
        xy_resolution: f64,
        phi_resolution: f64,
    ) -> GridIndex {
        let grid_x = ((x - bounds.x_min) / xy_resolution).floor() as i64;
        let grid_y = ((y - bounds.y_min) / xy_resolution).floor() as i64;
        let grid_phi = ((phi + PI) / phi_resolution).floor() as i64;
        (grid_x, grid_y, grid_phi)
    }

    /// Vehicle footprint box for a rear-axle pose
    pub fn bounding_box(vehicle: &VehicleParam, x: f64, y: f64, phi: f64) -> Box2d {
        let shift = vehicle.rear_axle_to_center();
        let center = Point2D::new(x + shift * phi.cos(), y + shift * phi.sin());
        Box2d::new(center, phi, vehicle.length, vehicle.width)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn phis(&self) -> &[f64] {
        &self.phis
    }

    pub fn index(&self) -> GridIndex {
        self.index
    }

    /// Number of poses swept by this node
    pub fn step_size(&self) -> usize {
        self.xs.len()
    }

    pub fn traj_cost(&self) -> f64 {
        self.traj_cost
    }

    pub fn heuristic_cost(&self) -> f64 {
        self.heuristic_cost
    }

    pub fn cost(&self) -> f64 {
        self.traj_cost + self.heuristic_cost
    }

    pub fn steering(&self) -> f64 {
        self.steering
    }

    pub fn direction(&self) -> bool {
        self.direction
    }

    pub fn pre(&self) -> Option<usize> {
        self.pre
    }

    pub fn set_traj_cost(&mut self, cost: f64) {
        self.traj_cost = cost;
    }

    pub fn set_heuristic_cost(&mut self, cost: f64) {
        self.heuristic_cost = cost;
    }

    pub fn set_steering(&mut self, steering: f64) {
        self.steering = steering;
    }

    pub fn set_direction(&mut self, forward: bool) {
        self.direction = forward;
    }

    pub fn set_pre(&mut self, pre: usize) {
        self.pre = Some(pre);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> AreaBounds {
        AreaBounds::new(-10.0, 10.0, -10.0, 10.0)
    }

    #[test]
    fn test_index_deterministic() {
        let pose = Pose2D::new(1.23, -4.56, 0.78);
        let a = Node3d::from_pose(&pose, &bounds(), 0.3, 0.1);
        let b = Node3d::from_pose(&pose, &bounds(), 0.3, 0.1);
        assert_eq!(a.index(), b.index());
    }

    #[test]
    fn test_same_cell_same_index() {
        // Cells are anchored at the workspace corner; with bounds starting
        // at -10 and resolution 0.3 one cell spans [-0.1, 0.2)
        let a = Node3d::from_pose(&Pose2D::new(0.01, 0.01, 0.0), &bounds(), 0.3, 0.1);
        let b = Node3d::from_pose(&Pose2D::new(0.15, 0.15, 0.05), &bounds(), 0.3, 0.1);
        assert_eq!(a.index(), b.index());
        let c = Node3d::from_pose(&Pose2D::new(0.25, 0.15, 0.05), &bounds(), 0.3, 0.1);
        assert_ne!(a.index(), c.index());
    }

    #[test]
    fn test_final_pose_is_last_sample() {
        let node = Node3d::new(
            vec![0.0, 0.5, 1.0],
            vec![0.0, 0.1, 0.2],
            vec![0.0, 0.05, 0.1],
            &bounds(),
            0.3,
            0.1,
        );
        assert_eq!(node.step_size(), 3);
        assert!((node.x() - 1.0).abs() < 1e-12);
        assert!((node.y() - 0.2).abs() < 1e-12);
        assert!((node.phi() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_cost_is_g_plus_h() {
        let mut node = Node3d::from_pose(&Pose2D::origin(), &bounds(), 0.3, 0.1);
        node.set_traj_cost(2.5);
        node.set_heuristic_cost(1.5);
        assert!((node.cost() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box_center_shift() {
        let vehicle = VehicleParam::default();
        let b = Node3d::bounding_box(&vehicle, 0.0, 0.0, 0.0);
        assert!((b.center.x - vehicle.rear_axle_to_center()).abs() < 1e-12);
        assert!(b.center.y.abs() < 1e-12);
    }
}
