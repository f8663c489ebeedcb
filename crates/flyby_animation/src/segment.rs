//! Solved brackets
//!
//! A [`SegmentMotion`] is what a track keeps for each pair of adjacent
//! keyframes once it has been refreshed: a kinematic [`Motion`] or a sampled
//! spring traversal, both answering "what fraction of the distance has been
//! covered after this many seconds".

use flyby_core::{TimeValue, Vector, Vector1};
use tracing::debug;

use crate::error::{AnimationError, Result};
use crate::motion::Motion;
use crate::params::MotionParams;
use crate::spring::{SpringParams, SpringSolver};

/// Samples per bracket kept in a spring profile
const PROFILE_RESOLUTION: f64 = 1000.0;

/// Progress model for one bracket
#[derive(Clone, Debug, PartialEq)]
pub enum SegmentMotion {
    Kinematic(Motion),
    Spring(SpringMotion),
}

impl SegmentMotion {
    /// Solve a bracket of `time` seconds covering `distance`
    ///
    /// `velocity_in` is only consulted by kinematic brackets.
    pub fn solve(
        params: &MotionParams,
        time: f64,
        distance: f64,
        velocity_in: f64,
        solver: &SpringSolver,
    ) -> Result<Self> {
        match params {
            MotionParams::Linear => Ok(SegmentMotion::Kinematic(Motion::constant(time, distance)?)),
            MotionParams::Kinematic(kinematic) => Ok(SegmentMotion::Kinematic(Motion::from_params(
                time,
                distance,
                kinematic,
                velocity_in,
            )?)),
            MotionParams::Spring(spring) => Ok(SegmentMotion::Spring(SpringMotion::solve(
                spring, time, distance, solver,
            )?)),
        }
    }

    /// Fraction of the bracket distance covered after `elapsed` seconds
    pub fn percent(&self, elapsed: f64) -> f64 {
        match self {
            SegmentMotion::Kinematic(motion) => motion.percent(elapsed),
            SegmentMotion::Spring(spring) => spring.percent(elapsed),
        }
    }

    pub fn time(&self) -> f64 {
        match self {
            SegmentMotion::Kinematic(motion) => motion.time(),
            SegmentMotion::Spring(spring) => spring.time(),
        }
    }

    pub fn velocity_in(&self) -> f64 {
        match self {
            SegmentMotion::Kinematic(motion) => motion.velocity_in(),
            SegmentMotion::Spring(_) => 0.0,
        }
    }

    /// Velocity at the end of the bracket, handed to a chained successor
    pub fn velocity_out(&self) -> f64 {
        match self {
            SegmentMotion::Kinematic(motion) => motion.velocity_out(),
            // A spring settles at rest
            SegmentMotion::Spring(_) => 0.0,
        }
    }
}

/// A spring traversal sampled into a progress profile
///
/// The spring runs over the unit interval, so its arrival epsilon is relative
/// to the bracket distance. The recorded traversal is stretched onto the
/// bracket duration and thinned to roughly [`PROFILE_RESOLUTION`] samples.
#[derive(Clone, Debug, PartialEq)]
pub struct SpringMotion {
    time: f64,
    distance: f64,
    /// Velocity cap used, in distance units per second
    max_velocity: f64,
    /// `(time, fraction)` samples, strictly increasing in time, from `(0, 0)` to `(time, 1)`
    profile: Vec<TimeValue>,
}

impl SpringMotion {
    pub fn solve(params: &SpringParams, time: f64, distance: f64, solver: &SpringSolver) -> Result<Self> {
        params.validate()?;
        if !time.is_finite() || time <= 0.0 {
            return Err(AnimationError::InvalidParameters(format!(
                "segment time must be positive, got {}",
                time
            )));
        }

        if distance <= solver.epsilon {
            return Ok(Self {
                time,
                distance,
                max_velocity: 0.0,
                profile: vec![TimeValue::new(0.0, 0.0), TimeValue::new(time, 1.0)],
            });
        }

        let start = Vector1::from(0.0);
        let target = Vector1::from(1.0);

        let fraction_cap = match params.max_velocity {
            Some(max_velocity) => max_velocity / distance,
            None => match solver.velocity_for_time(params, &start, &target, time)? {
                Some(cap) => cap,
                None => {
                    let minimum_time =
                        solver.time_to_destination(params, &start, &target, f64::INFINITY)?;
                    return Err(AnimationError::SpringInfeasible {
                        target_time: time,
                        minimum_time,
                    });
                }
            },
        };

        let samples = solver.trace(params, &start, &target, fraction_cap)?;
        let arrival = samples.last().map(|(t, _)| *t).unwrap_or(0.0);
        let stretch = if arrival > 0.0 { time / arrival } else { 1.0 };
        debug!(time, distance, fraction_cap, arrival, "spring segment solved");

        let spacing = time / PROFILE_RESOLUTION;
        let mut profile = vec![TimeValue::new(0.0, 0.0)];
        let mut reached = 0.0_f64;
        for (t, position) in samples.iter().skip(1) {
            reached = reached.max(position.x.clamp(0.0, 1.0));
            let sample = TimeValue::new(t * stretch, reached);
            let last = profile[profile.len() - 1];
            if sample.subtract(&last).distance() >= spacing && sample.time < time {
                profile.push(sample);
            }
        }
        profile.push(TimeValue::new(time, 1.0));

        Ok(Self {
            time,
            distance,
            max_velocity: fraction_cap * distance,
            profile,
        })
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    pub fn profile(&self) -> &[TimeValue] {
        &self.profile
    }

    pub fn percent(&self, elapsed: f64) -> f64 {
        if elapsed <= 0.0 {
            return 0.0;
        }
        if elapsed >= self.time {
            return 1.0;
        }

        let index = self
            .profile
            .partition_point(|sample| sample.time <= elapsed)
            .clamp(1, self.profile.len() - 1);
        let before = &self.profile[index - 1];
        let after = &self.profile[index];
        let span = after.time - before.time;
        if span <= 0.0 {
            return after.value;
        }
        before
            .interpolate(after, (elapsed - before.time) / span)
            .value
            .clamp(0.0, 1.0)
    }
}
