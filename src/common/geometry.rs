//! Collision geometry: line segments and oriented bounding boxes
//!
//! Obstacles reach the planner as polygon edge segments; the vehicle
//! footprint is an oriented box. The only query the search needs is an
//! exact box-versus-segment overlap test.

use crate::common::types::Point2D;

/// Line segment between two points
#[derive(Debug, Clone, Copy)]
pub struct LineSegment2d {
    pub start: Point2D,
    pub end: Point2D,
}

impl LineSegment2d {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// Oriented bounding box defined by center, heading, length, and width
#[derive(Debug, Clone, Copy)]
pub struct Box2d {
    pub center: Point2D,
    pub heading: f64,
    pub length: f64,
    pub width: f64,
    half_length: f64,
    half_width: f64,
    cos_heading: f64,
    sin_heading: f64,
}

impl Box2d {
    pub fn new(center: Point2D, heading: f64, length: f64, width: f64) -> Self {
        Self {
            center,
            heading,
            length,
            width,
            half_length: length / 2.0,
            half_width: width / 2.0,
            cos_heading: heading.cos(),
            sin_heading: heading.sin(),
        }
    }

    /// Corners in counter-clockwise order starting from front-left
    pub fn corners(&self) -> [Point2D; 4] {
        let dx_l = self.cos_heading * self.half_length;
        let dy_l = self.sin_heading * self.half_length;
        let dx_w = -self.sin_heading * self.half_width;
        let dy_w = self.cos_heading * self.half_width;
        [
            Point2D::new(self.center.x + dx_l + dx_w, self.center.y + dy_l + dy_w),
            Point2D::new(self.center.x - dx_l + dx_w, self.center.y - dy_l + dy_w),
            Point2D::new(self.center.x - dx_l - dx_w, self.center.y - dy_l - dy_w),
            Point2D::new(self.center.x + dx_l - dx_w, self.center.y + dy_l - dy_w),
        ]
    }

    /// Map a point into the box frame (origin at center, x along heading)
    fn to_local(&self, p: &Point2D) -> (f64, f64) {
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;
        (
            self.cos_heading * dx + self.sin_heading * dy,
            -self.sin_heading * dx + self.cos_heading * dy,
        )
    }

    pub fn is_point_in(&self, p: &Point2D) -> bool {
        let (lx, ly) = self.to_local(p);
        lx.abs() <= self.half_length && ly.abs() <= self.half_width
    }

    /// Exact overlap test against a line segment.
    ///
    /// The segment is transformed into the box frame, where the box is an
    /// axis-aligned rectangle, and clipped against the rectangle slabs.
    /// A non-empty clipped parameter interval means overlap; segments fully
    /// inside the box count as overlapping.
    pub fn has_overlap(&self, segment: &LineSegment2d) -> bool {
        let (sx, sy) = self.to_local(&segment.start);
        let (ex, ey) = self.to_local(&segment.end);
        let dx = ex - sx;
        let dy = ey - sy;

        let mut t_min = 0.0_f64;
        let mut t_max = 1.0_f64;
        for (origin, dir, extent) in [
            (sx, dx, self.half_length),
            (sy, dy, self.half_width),
        ] {
            if dir.abs() < 1e-12 {
                if origin.abs() > extent {
                    return false;
                }
                continue;
            }
            let t0 = (-extent - origin) / dir;
            let t1 = (extent - origin) / dir;
            let (lo, hi) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
            t_min = t_min.max(lo);
            t_max = t_max.min(hi);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_length() {
        let seg = LineSegment2d::new(Point2D::new(0.0, 0.0), Point2D::new(3.0, 4.0));
        assert!((seg.length() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_corners_axis_aligned() {
        let b = Box2d::new(Point2D::new(1.0, 1.0), 0.0, 4.0, 2.0);
        let corners = b.corners();
        assert!((corners[0].x - 3.0).abs() < 1e-10);
        assert!((corners[0].y - 2.0).abs() < 1e-10);
        assert!((corners[2].x - (-1.0)).abs() < 1e-10);
        assert!((corners[2].y - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_overlap_crossing_segment() {
        let b = Box2d::new(Point2D::origin(), 0.0, 2.0, 2.0);
        let seg = LineSegment2d::new(Point2D::new(-2.0, 0.0), Point2D::new(2.0, 0.0));
        assert!(b.has_overlap(&seg));
    }

    #[test]
    fn test_overlap_segment_inside() {
        let b = Box2d::new(Point2D::origin(), 0.0, 4.0, 4.0);
        let seg = LineSegment2d::new(Point2D::new(-0.5, 0.5), Point2D::new(0.5, -0.5));
        assert!(b.has_overlap(&seg));
    }

    #[test]
    fn test_no_overlap_disjoint() {
        let b = Box2d::new(Point2D::origin(), 0.0, 2.0, 2.0);
        let seg = LineSegment2d::new(Point2D::new(2.0, 2.0), Point2D::new(3.0, 2.0));
        assert!(!b.has_overlap(&seg));
    }

    #[test]
    fn test_no_overlap_parallel_outside() {
        let b = Box2d::new(Point2D::origin(), 0.0, 2.0, 2.0);
        let seg = LineSegment2d::new(Point2D::new(-5.0, 1.5), Point2D::new(5.0, 1.5));
        assert!(!b.has_overlap(&seg));
    }

    #[test]
    fn test_overlap_rotated_box() {
        use std::f64::consts::FRAC_PI_4;
        // Box rotated 45 degrees reaches out to sqrt(2) along the diagonal
        let b = Box2d::new(Point2D::origin(), FRAC_PI_4, 2.0, 2.0);
        let reaching = LineSegment2d::new(Point2D::new(1.3, 0.0), Point2D::new(3.0, 0.0));
        assert!(b.has_overlap(&reaching));
        // The same segment misses the axis-aligned box of the same size
        let b0 = Box2d::new(Point2D::origin(), 0.0, 2.0, 2.0);
        assert!(!b0.has_overlap(&reaching));
    }

    #[test]
    fn test_point_in_box() {
        let b = Box2d::new(Point2D::new(2.0, 0.0), 0.0, 2.0, 1.0);
        assert!(b.is_point_in(&Point2D::new(2.5, 0.2)));
        assert!(!b.is_point_in(&Point2D::new(2.5, 0.7)));
    }
}
