//! Spring-damper motion
//!
//! An alternative to the three-phase kinematic profile: the camera is pulled
//! towards its destination by a damped spring, with an optional cap on its
//! speed. The integrator is generic over [`Vector`], so the same code drives a
//! single track fraction or a whole [`flyby_core::CameraVector`].
//!
//! [`SpringSolver::velocity_for_time`] inverts the traversal: it bisects over
//! the velocity cap to find the one whose traversal takes a requested time.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use flyby_core::Vector;

use crate::error::{AnimationError, Result};

/// Distance under which a traversal counts as arrived, and the bisection tolerance
///
/// Smaller values lengthen the settling tail of every traversal and add
/// bisection iterations; larger values let a cap be accepted before the
/// spring has visibly settled.
pub const CONVERGENCE_EPSILON: f64 = 1e-8;

/// Default integration step in seconds
pub const DEFAULT_TIME_STEP: f64 = 1.0 / 120.0;

/// Step size below which adaptive halving gives up
pub const MIN_TIME_STEP: f64 = 1e-12;

/// Configuration for spring-driven motion
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParams {
    /// Stiffness `k` (unit mass)
    pub spring_constant: f64,
    /// Damping as a multiple of critical damping; must be at least 1
    pub damping_ratio: f64,
    /// Speed cap in distance units per second; `None` searches for the cap
    /// that makes the traversal fill its bracket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_velocity: Option<f64>,
    /// When false, speed never drops while still below the cap
    pub allow_deceleration: bool,
}

impl SpringParams {
    /// Create a new spring configuration
    pub fn new(spring_constant: f64, damping_ratio: f64) -> Self {
        Self {
            spring_constant,
            damping_ratio,
            max_velocity: None,
            allow_deceleration: true,
        }
    }

    /// A soft spring, for long sweeping moves
    pub fn gentle() -> Self {
        Self::new(25.0, 1.0)
    }

    /// A balanced critically damped spring
    pub fn smooth() -> Self {
        Self::new(100.0, 1.0)
    }

    /// A stiff spring that settles quickly, for short brackets
    pub fn stiff() -> Self {
        Self::new(400.0, 1.0)
    }

    /// A slow spring with extra damping
    pub fn molasses() -> Self {
        Self::new(100.0, 1.5)
    }

    pub fn with_max_velocity(mut self, max_velocity: f64) -> Self {
        self.max_velocity = Some(max_velocity);
        self
    }

    pub fn without_deceleration(mut self) -> Self {
        self.allow_deceleration = false;
        self
    }

    /// Critical damping coefficient for this stiffness
    pub fn critical_damping(&self) -> f64 {
        2.0 * self.spring_constant.sqrt()
    }

    /// Damping coefficient applied to velocity
    pub fn damping(&self) -> f64 {
        self.damping_ratio * self.critical_damping()
    }

    /// Check if the spring is critically damped (no oscillation, fastest settling)
    pub fn is_critically_damped(&self) -> bool {
        (self.damping_ratio - 1.0).abs() < 0.01
    }

    /// Check if the spring is overdamped (slow settling, no oscillation)
    pub fn is_overdamped(&self) -> bool {
        self.damping_ratio > 1.0
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.spring_constant.is_finite() && self.spring_constant > 0.0) {
            return Err(AnimationError::InvalidParameters(format!(
                "spring constant must be positive, got {}",
                self.spring_constant
            )));
        }
        // An underdamped spring overshoots physically, which the step
        // halving would mistake for integration error forever
        if !(self.damping_ratio.is_finite() && self.damping_ratio >= 1.0) {
            return Err(AnimationError::InvalidParameters(format!(
                "damping ratio must be at least 1, got {}",
                self.damping_ratio
            )));
        }
        if let Some(max_velocity) = self.max_velocity {
            if !(max_velocity > 0.0) {
                return Err(AnimationError::InvalidParameters(format!(
                    "max velocity must be positive, got {}",
                    max_velocity
                )));
            }
        }
        Ok(())
    }
}

impl Default for SpringParams {
    fn default() -> Self {
        Self::smooth()
    }
}

/// Position and velocity of a spring-driven point
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpringState<V> {
    pub position: V,
    pub velocity: V,
}

impl<V: Vector> SpringState<V> {
    pub fn at_rest(position: V) -> Self {
        Self {
            position,
            velocity: V::create_new(),
        }
    }
}

#[derive(Clone)]
struct Snapshot<V> {
    state: SpringState<V>,
    time: f64,
    distance: f64,
}

/// Fixed-step spring integrator with adaptive overshoot recovery
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringSolver {
    /// Initial integration step in seconds
    pub time_step: f64,
    /// Arrival distance and bisection tolerance
    pub epsilon: f64,
    /// Step budget for one traversal
    pub max_steps: usize,
    /// Iteration budget for the velocity bisection
    pub max_bisections: usize,
}

impl Default for SpringSolver {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            epsilon: CONVERGENCE_EPSILON,
            max_steps: 1_000_000,
            max_bisections: 200,
        }
    }
}

impl SpringSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `state` one step of `dt` seconds towards `target`
    ///
    /// `velocity += (-k · displacement - c · velocity) · dt`, then the speed is
    /// clamped to `max_velocity` and, if deceleration is disallowed, held at
    /// its previous magnitude while still below the cap.
    pub fn spring<V: Vector>(
        &self,
        params: &SpringParams,
        state: &mut SpringState<V>,
        target: &V,
        max_velocity: f64,
        dt: f64,
    ) {
        let mut acceleration = state.position.subtract(target);
        acceleration.scale_local(-params.spring_constant);
        acceleration.subtract_local(&state.velocity.scale(params.damping()));

        let previous_speed = state.velocity.distance();
        let mut velocity = state.velocity.clone();
        velocity.add_local(&acceleration.scale(dt));

        let speed = velocity.distance();
        if speed > max_velocity {
            velocity.scale_local(max_velocity / speed);
        } else if !params.allow_deceleration
            && speed > 0.0
            && speed < previous_speed
            && previous_speed < max_velocity
        {
            velocity.scale_local(previous_speed / speed);
        }

        state.velocity = velocity;
        state.position.add_local(&state.velocity.scale(dt));
    }

    /// Seconds a traversal from rest at `start` takes to settle within `epsilon` of `target`
    pub fn time_to_destination<V: Vector>(
        &self,
        params: &SpringParams,
        start: &V,
        target: &V,
        max_velocity: f64,
    ) -> Result<f64> {
        self.integrate(params, start, target, max_velocity, None)
    }

    /// Like [`SpringSolver::time_to_destination`], also returning every accepted `(time, position)`
    pub fn trace<V: Vector>(
        &self,
        params: &SpringParams,
        start: &V,
        target: &V,
        max_velocity: f64,
    ) -> Result<Vec<(f64, V)>> {
        let mut samples = Vec::new();
        self.integrate(params, start, target, max_velocity, Some(&mut samples))?;
        Ok(samples)
    }

    /// The velocity cap whose traversal takes `target_time` seconds
    ///
    /// Returns `Ok(None)` when even an uncapped spring cannot arrive in time.
    /// The returned cap errs on the fast side: its traversal never takes longer
    /// than `target_time` plus `epsilon`.
    pub fn velocity_for_time<V: Vector>(
        &self,
        params: &SpringParams,
        start: &V,
        target: &V,
        target_time: f64,
    ) -> Result<Option<f64>> {
        let distance = target.subtract(start).distance();
        if distance <= self.epsilon {
            return Ok(Some(0.0));
        }
        if !(target_time > 0.0) {
            return Ok(None);
        }

        let minimum_time = self.time_to_destination(params, start, target, f64::INFINITY)?;
        if target_time + self.epsilon < minimum_time {
            debug!(target_time, minimum_time, "spring cannot arrive in time");
            return Ok(None);
        }

        let arrival = |cap: f64| self.time_to_destination(params, start, target, cap);

        // Covering the distance at the cap alone already takes target_time,
        // so this cap is always too slow once acceleration is accounted for
        let mut low = distance / target_time;
        let mut high = low;
        let mut found = false;
        for _ in 0..64 {
            high *= 2.0;
            if arrival(high)? <= target_time + self.epsilon {
                found = true;
                break;
            }
            low = high;
        }
        if !found {
            return Ok(Some(f64::INFINITY));
        }

        for iteration in 0..self.max_bisections {
            if high - low <= self.epsilon * high.max(1.0) {
                break;
            }
            let mid = 0.5 * (low + high);
            let time = arrival(mid)?;
            trace!(iteration, low, high, mid, time, "velocity bisection");
            if (time - target_time).abs() <= self.epsilon {
                return Ok(Some(mid));
            }
            if time > target_time {
                low = mid;
            } else {
                high = mid;
            }
        }

        Ok(Some(high))
    }

    fn integrate<V: Vector>(
        &self,
        params: &SpringParams,
        start: &V,
        target: &V,
        max_velocity: f64,
        mut samples: Option<&mut Vec<(f64, V)>>,
    ) -> Result<f64> {
        let mut state = SpringState::at_rest(start.clone());
        let mut distance = target.subtract(start).distance();
        let mut time = 0.0;
        let mut dt = self.time_step;
        let mut previous: Option<Snapshot<V>> = None;
        let mut steps = 0;

        if let Some(samples) = samples.as_deref_mut() {
            samples.clear();
            samples.push((0.0, start.clone()));
        }

        while distance > self.epsilon {
            steps += 1;
            if steps > self.max_steps {
                return Err(AnimationError::SpringDiverged { steps: self.max_steps });
            }

            let current = Snapshot {
                state: state.clone(),
                time,
                distance,
            };
            self.spring(params, &mut state, target, max_velocity, dt);
            let next_distance = target.subtract(&state.position).distance();

            if next_distance > distance {
                // Moving away means the step overshot: back up two steps and refine
                let rewind = previous.take().unwrap_or(current);
                state = rewind.state;
                time = rewind.time;
                distance = rewind.distance;
                dt *= 0.5;
                trace!(time, dt, "spring step overshot, rewinding");

                if let Some(samples) = samples.as_deref_mut() {
                    let keep = samples.partition_point(|(t, _)| *t <= time);
                    samples.truncate(keep);
                }
                if dt < MIN_TIME_STEP {
                    return Err(AnimationError::SpringDiverged { steps });
                }
                continue;
            }

            time += dt;
            distance = next_distance;
            previous = Some(current);
            if let Some(samples) = samples.as_deref_mut() {
                samples.push((time, state.position.clone()));
            }
        }

        trace!(time, steps, "spring arrived");
        Ok(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flyby_core::{CameraVector, Vector1};

    #[test]
    fn test_spring_step_moves_towards_target() {
        let solver = SpringSolver::new();
        let params = SpringParams::smooth();
        let mut state = SpringState::at_rest(Vector1::from(0.0));
        let target = Vector1::from(1.0);

        solver.spring(&params, &mut state, &target, f64::INFINITY, 0.01);
        assert!(state.velocity.x > 0.0);
        assert!(state.position.x > 0.0 && state.position.x < 1.0);
    }

    #[test]
    fn test_spring_respects_velocity_cap() {
        let solver = SpringSolver::new();
        let params = SpringParams::stiff();
        let mut state = SpringState::at_rest(Vector1::from(0.0));
        let target = Vector1::from(100.0);

        for _ in 0..100 {
            solver.spring(&params, &mut state, &target, 2.0, 0.01);
            assert!(state.velocity.distance() <= 2.0 + 1e-12);
        }
    }

    #[test]
    fn test_time_to_destination_converges() {
        let solver = SpringSolver::new();
        let params = SpringParams::smooth();
        let time = solver
            .time_to_destination(&params, &Vector1::from(0.0), &Vector1::from(1.0), f64::INFINITY)
            .unwrap();
        // Critically damped at ω = 10 settles to 1e-8 after roughly 2.15 s
        assert!(time > 1.5 && time < 3.0, "time {}", time);
    }

    #[test]
    fn test_cap_slows_traversal() {
        let solver = SpringSolver::new();
        let params = SpringParams::smooth();
        let start = Vector1::from(0.0);
        let target = Vector1::from(1.0);

        let free = solver
            .time_to_destination(&params, &start, &target, f64::INFINITY)
            .unwrap();
        let capped = solver.time_to_destination(&params, &start, &target, 0.25).unwrap();
        assert!(capped > free);
        assert!(capped >= 4.0);
    }

    #[test]
    fn test_without_deceleration_still_arrives() {
        let solver = SpringSolver::new();
        let params = SpringParams::smooth().without_deceleration();
        let time = solver
            .time_to_destination(&params, &Vector1::from(0.0), &Vector1::from(1.0), f64::INFINITY)
            .unwrap();
        assert!(time.is_finite() && time > 0.0);
    }

    #[test]
    fn test_trace_is_ordered_and_ends_at_target() {
        let solver = SpringSolver::new();
        let params = SpringParams::smooth();
        let samples = solver
            .trace(&params, &Vector1::from(0.0), &Vector1::from(1.0), 0.8)
            .unwrap();
        assert_eq!(samples[0].0, 0.0);
        assert!(samples.windows(2).all(|w| w[1].0 > w[0].0));
        let last = samples.last().unwrap();
        assert!((last.1.x - 1.0).abs() <= CONVERGENCE_EPSILON);
    }

    #[test]
    fn test_velocity_for_time_hits_target() {
        let solver = SpringSolver::new();
        let params = SpringParams::smooth();
        let start = Vector1::from(0.0);
        let target = Vector1::from(1.0);

        let cap = solver
            .velocity_for_time(&params, &start, &target, 5.0)
            .unwrap()
            .expect("5 s is reachable");
        assert!(cap > 0.2 && cap.is_finite());

        let time = solver.time_to_destination(&params, &start, &target, cap).unwrap();
        assert!(time <= 5.0 + 1e-6, "time {}", time);
        assert!(time > 4.5, "time {}", time);
    }

    #[test]
    fn test_velocity_for_time_infeasible() {
        let solver = SpringSolver::new();
        let params = SpringParams::smooth();
        let cap = solver
            .velocity_for_time(&params, &Vector1::from(0.0), &Vector1::from(1.0), 0.5)
            .unwrap();
        assert_eq!(cap, None);
    }

    #[test]
    fn test_velocity_for_time_zero_distance() {
        let solver = SpringSolver::new();
        let cap = solver
            .velocity_for_time(&SpringParams::smooth(), &Vector1::from(3.0), &Vector1::from(3.0), 1.0)
            .unwrap();
        assert_eq!(cap, Some(0.0));
    }

    #[test]
    fn test_generic_over_camera_vector() {
        let solver = SpringSolver::new();
        let params = SpringParams::stiff();
        let start = CameraVector::new(-27.0, 153.0, 10.0, 0.0, 30.0);
        let target = CameraVector::new(-33.0, 151.0, 4.0, 45.0, 60.0);
        let samples = solver.trace(&params, &start, &target, f64::INFINITY).unwrap();
        let last = &samples.last().unwrap().1;
        assert!(last.subtract(&target).distance() <= CONVERGENCE_EPSILON);
    }

    #[test]
    fn test_params_validation() {
        assert!(SpringParams::smooth().validate().is_ok());
        assert!(SpringParams::new(0.0, 1.0).validate().is_err());
        assert!(SpringParams::new(100.0, 0.5).validate().is_err());
        assert!(SpringParams::smooth().with_max_velocity(0.0).validate().is_err());
        assert!(SpringParams::smooth().is_critically_damped());
        assert!(SpringParams::molasses().is_overdamped());
        assert_eq!(SpringParams::smooth().damping(), 20.0);
    }
}
