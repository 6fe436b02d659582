//! Convex optimization utilities for trajectory post-processing

pub mod piecewise_jerk;

pub use piecewise_jerk::PathTimeQpProblem;
