//! Error types for flyby_animation

use thiserror::Error;

use crate::track::TrackKind;

/// Errors raised while solving or sampling camera motion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// No three-phase profile covers the distance in the time with these accelerations
    #[error(
        "cannot cover distance {distance} in {time}s (entry velocity {velocity_in}, exit velocity {velocity_out}) with the requested accelerations"
    )]
    Unsatisfiable {
        time: f64,
        distance: f64,
        velocity_in: f64,
        velocity_out: f64,
    },

    /// A spring traversal cannot finish within the bracket duration at any velocity cap
    #[error("spring cannot arrive within {target_time}s; fastest traversal takes {minimum_time}s")]
    SpringInfeasible { target_time: f64, minimum_time: f64 },

    /// The spring integrator ran out of steps before reaching its destination
    #[error("spring integration did not converge after {steps} steps")]
    SpringDiverged { steps: usize },

    /// A chained segment was solved before the segment feeding its entry velocity
    #[error("{track} segment {index} chains from segment {} which has not been solved", .index.saturating_sub(1))]
    UnsolvedPredecessor { track: TrackKind, index: usize },

    /// A bracket was sampled without a solved segment
    #[error("{track} segment {index} has not been solved")]
    UnsolvedSegment { track: TrackKind, index: usize },

    /// Keyframe times must be finite and non-negative
    #[error("invalid keyframe time: {0}")]
    InvalidTime(f64),

    /// Motion parameters out of their valid domain
    #[error("invalid motion parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for flyby_animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
