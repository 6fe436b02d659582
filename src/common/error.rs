//! Error types for the planner

use std::fmt;

/// Main error type for planning operations
#[derive(Debug)]
pub enum PlanningError {
    /// Start pose is out of bounds or overlaps an obstacle
    StartInCollision,
    /// Goal pose is out of bounds or overlaps an obstacle
    GoalInCollision,
    /// Search finished without reaching the goal
    OpenSetExhausted,
    /// Reconstructed path too short to parameterize in time
    SpeedProfileDegenerate(String),
    /// Piecewise-jerk speed optimizer failed
    QpInfeasible(String),
    /// Result array lengths violate the output contract
    SizeInvariantViolated(String),
}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningError::StartInCollision => write!(f, "start pose in collision with obstacles"),
            PlanningError::GoalInCollision => write!(f, "goal pose in collision with obstacles"),
            PlanningError::OpenSetExhausted => write!(f, "open set ran out before reaching goal"),
            PlanningError::SpeedProfileDegenerate(msg) => {
                write!(f, "degenerate path for speed profile: {}", msg)
            }
            PlanningError::QpInfeasible(msg) => {
                write!(f, "piecewise jerk speed optimizer failed: {}", msg)
            }
            PlanningError::SizeInvariantViolated(msg) => {
                write!(f, "result size check failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for PlanningError {}

/// Result type alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanningError::OpenSetExhausted;
        assert_eq!(format!("{}", err), "open set ran out before reaching goal");
    }

    #[test]
    fn test_error_display_with_detail() {
        let err = PlanningError::QpInfeasible("not positive definite".to_string());
        assert!(format!("{}", err).contains("not positive definite"));
    }
}
