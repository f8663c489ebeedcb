//! Per-keyframe motion parameters
//!
//! Every keyframe after the first carries the [`MotionParams`] describing how
//! the camera travels *into* it from the previous keyframe on the same track.

use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};
use crate::spring::SpringParams;

/// How a track moves through one bracket
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionParams {
    /// Constant velocity across the bracket
    #[default]
    Linear,
    /// Three-phase accelerate / cruise / decelerate profile
    Kinematic(KinematicParams),
    /// Spring-driven ease in and out
    Spring(SpringParams),
}

impl MotionParams {
    /// Constant velocity
    pub fn linear() -> Self {
        Self::Linear
    }

    /// Symmetric ease in and out from and to rest, accelerations derived from the bracket
    pub fn smooth() -> Self {
        Self::Kinematic(KinematicParams {
            calculate_accelerations: true,
            ..Default::default()
        })
    }

    /// Explicit entry and exit accelerations, starting and ending at rest
    pub fn eased(acceleration_in: f64, acceleration_out: f64) -> Self {
        Self::Kinematic(KinematicParams::new(acceleration_in, acceleration_out))
    }

    /// Spring easing with the given parameters
    pub fn spring(params: SpringParams) -> Self {
        Self::Spring(params)
    }

    /// Check the parameters are inside their valid domain
    pub fn validate(&self) -> Result<()> {
        match self {
            MotionParams::Linear => Ok(()),
            MotionParams::Kinematic(params) => params.validate(),
            MotionParams::Spring(params) => params.validate(),
        }
    }

    /// Whether this bracket takes its entry velocity from the previous bracket
    pub fn uses_previous_for_in(&self) -> bool {
        matches!(self, MotionParams::Kinematic(p) if p.use_previous_for_in)
    }
}

/// Boundary conditions of a three-phase kinematic segment
///
/// Velocities are in track distance units per second (degrees for angles and
/// centers, zoom units for zoom); accelerations in units per second squared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicParams {
    /// Phase one acceleration magnitude
    pub acceleration_in: f64,
    /// Phase three deceleration magnitude
    pub acceleration_out: f64,
    /// Entry velocity (ignored when `use_previous_for_in` chains a solved predecessor)
    pub velocity_in: f64,
    /// Desired exit velocity
    pub velocity_out: f64,
    /// Split the bracket in half and derive both accelerations
    pub calculate_accelerations: bool,
    /// Skip phase one: enter directly at cruise velocity
    pub ignore_in: bool,
    /// Skip phase three: leave at cruise velocity
    pub ignore_out: bool,
    /// Enter at the previous bracket's exit velocity
    pub use_previous_for_in: bool,
}

impl Default for KinematicParams {
    fn default() -> Self {
        Self {
            acceleration_in: 1.0,
            acceleration_out: 1.0,
            velocity_in: 0.0,
            velocity_out: 0.0,
            calculate_accelerations: false,
            ignore_in: false,
            ignore_out: false,
            use_previous_for_in: false,
        }
    }
}

impl KinematicParams {
    pub fn new(acceleration_in: f64, acceleration_out: f64) -> Self {
        Self {
            acceleration_in,
            acceleration_out,
            ..Default::default()
        }
    }

    pub fn with_velocities(mut self, velocity_in: f64, velocity_out: f64) -> Self {
        self.velocity_in = velocity_in;
        self.velocity_out = velocity_out;
        self
    }

    pub fn chained(mut self) -> Self {
        self.use_previous_for_in = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let velocities = [self.velocity_in, self.velocity_out];
        if velocities.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AnimationError::InvalidParameters(format!(
                "velocities must be finite and non-negative (in {}, out {})",
                self.velocity_in, self.velocity_out
            )));
        }
        if self.calculate_accelerations {
            return Ok(());
        }
        if !self.ignore_in && !(self.acceleration_in.is_finite() && self.acceleration_in > 0.0) {
            return Err(AnimationError::InvalidParameters(format!(
                "acceleration_in must be positive, got {}",
                self.acceleration_in
            )));
        }
        if !self.ignore_out && !(self.acceleration_out.is_finite() && self.acceleration_out > 0.0)
        {
            return Err(AnimationError::InvalidParameters(format!(
                "acceleration_out must be positive, got {}",
                self.acceleration_out
            )));
        }
        Ok(())
    }
}
