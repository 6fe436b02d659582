//! Obstacle-aware cost-to-go field on a 2-D grid
//!
//! A Dijkstra expansion rooted at the goal cell over an occupancy grid at
//! the lattice resolution. Queries return a holonomic lower bound on the
//! remaining trajectory cost, used as the Hybrid A* heuristic.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use itertools::iproduct;
use ordered_float::NotNan;

use crate::common::geometry::LineSegment2d;
use crate::common::types::AreaBounds;

/// Goal-rooted distance field over the workspace grid
pub struct GridSearch {
    xy_resolution: f64,
    x_min: f64,
    y_min: f64,
    nx: i64,
    ny: i64,
    blocked: Vec<bool>,
    dp_map: Vec<f64>,
}

impl GridSearch {
    pub fn new(xy_resolution: f64) -> Self {
        Self {
            xy_resolution,
            x_min: 0.0,
            y_min: 0.0,
            nx: 0,
            ny: 0,
            blocked: Vec::new(),
            dp_map: Vec::new(),
        }
    }

    /// Build the distance field rooted at the goal position. Cells touched
    /// by an obstacle edge are blocked; the remaining cells receive their
    /// 8-connected shortest distance to the goal cell in metric units.
    pub fn generate_dp_map(
        &mut self,
        goal_x: f64,
        goal_y: f64,
        bounds: &AreaBounds,
        obstacle_segments: &[Vec<LineSegment2d>],
    ) {
        self.x_min = bounds.x_min;
        self.y_min = bounds.y_min;
        self.nx = ((bounds.x_width() / self.xy_resolution).ceil() as i64).max(1);
        self.ny = ((bounds.y_width() / self.xy_resolution).ceil() as i64).max(1);
        let cells = (self.nx * self.ny) as usize;
        self.blocked = vec![false; cells];
        self.dp_map = vec![f64::INFINITY; cells];

        for segments in obstacle_segments {
            for segment in segments {
                self.rasterize_segment(segment);
            }
        }

        let Some((gx, gy)) = self.cell_of(goal_x, goal_y) else {
            return;
        };
        let goal_idx = self.flat(gx, gy);
        if self.blocked[goal_idx] {
            return;
        }

        let diagonal = std::f64::consts::SQRT_2 * self.xy_resolution;
        let mut heap: BinaryHeap<Reverse<(NotNan<f64>, (i64, i64))>> = BinaryHeap::new();
        self.dp_map[goal_idx] = 0.0;
        heap.push(Reverse((NotNan::new(0.0).unwrap(), (gx, gy))));

        while let Some(Reverse((cost, (cx, cy)))) = heap.pop() {
            let cost = cost.into_inner();
            if cost > self.dp_map[self.flat(cx, cy)] {
                continue;
            }
            for (dx, dy) in iproduct!(-1i64..=1, -1i64..=1) {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (cx + dx, cy + dy);
                if nx < 0 || nx >= self.nx || ny < 0 || ny >= self.ny {
                    continue;
                }
                let idx = self.flat(nx, ny);
                if self.blocked[idx] {
                    continue;
                }
                let edge = if dx != 0 && dy != 0 {
                    diagonal
                } else {
                    self.xy_resolution
                };
                let next_cost = cost + edge;
                if next_cost < self.dp_map[idx] {
                    self.dp_map[idx] = next_cost;
                    heap.push(Reverse((NotNan::new(next_cost).unwrap(), (nx, ny))));
                }
            }
        }
    }

    /// Cost-to-go lower bound for a workspace position. Out-of-map,
    /// blocked, and unreached cells query as infinity.
    pub fn check_dp_map(&self, x: f64, y: f64) -> f64 {
        match self.cell_of(x, y) {
            Some((ix, iy)) => self.dp_map[self.flat(ix, iy)],
            None => f64::INFINITY,
        }
    }

    fn rasterize_segment(&mut self, segment: &LineSegment2d) {
        let length = segment.length();
        let step = self.xy_resolution * 0.25;
        let samples = (length / step).ceil() as usize + 1;
        for i in 0..=samples {
            let t = i as f64 / samples as f64;
            let px = segment.start.x + t * (segment.end.x - segment.start.x);
            let py = segment.start.y + t * (segment.end.y - segment.start.y);
            if let Some((ix, iy)) = self.cell_of(px, py) {
                let idx = self.flat(ix, iy);
                self.blocked[idx] = true;
            }
        }
    }

    fn cell_of(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let ix = ((x - self.x_min) / self.xy_resolution).floor() as i64;
        let iy = ((y - self.y_min) / self.xy_resolution).floor() as i64;
        if ix < 0 || ix >= self.nx || iy < 0 || iy >= self.ny {
            None
        } else {
            Some((ix, iy))
        }
    }

    fn flat(&self, ix: i64, iy: i64) -> usize {
        (iy * self.nx + ix) as usize
    }
}
