//! Three-phase kinematic segment solver
//!
//! A [`Motion`] covers a fixed distance in a fixed time with a velocity
//! profile made of three phases:
//!
//! 1. accelerate from the entry velocity `v1` to the cruise velocity `v2`
//! 2. cruise at `v2`
//! 3. decelerate from `v2` to the exit velocity `v3`
//!
//! With explicit accelerations the cruise velocity is the root of a
//! quadratic. A root is only accepted if every phase duration, distance and
//! velocity is non-negative and the phase three distance obtained by
//! subtraction agrees with the one obtained from kinematics. When neither
//! root is valid the solver retries with the acceleration signs flipped in
//! the order given by [`SIGN_COMBINATIONS`] before giving up.

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::error::{AnimationError, Result};
use crate::params::KinematicParams;

/// Closure tolerance between the subtracted and kinematic phase three distances
///
/// Scaled by `max(1, distance)` so long brackets are judged relative to their size.
pub const MOTION_EPSILON: f64 = 1e-8;

/// Machine epsilon, used for zero tests on quadratic coefficients
pub const DBL_EPSILON: f64 = f64::EPSILON;

/// Multipliers applied to `(acceleration_in, acceleration_out)` on each attempt:
/// as requested, exit negated, entry negated, both negated.
pub const SIGN_COMBINATIONS: [(f64, f64); 4] = [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)];

/// Which rule produced a motion profile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionMode {
    /// Single cruise phase at `distance / time`
    Constant,
    /// Time split in half, accelerations derived from the boundary velocities
    Calculated,
    /// Accelerations supplied by the caller
    Explicit,
}

/// One phase of a motion profile
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Phase {
    pub duration: f64,
    pub start_velocity: f64,
    /// Signed rate of change of velocity during the phase
    pub acceleration: f64,
    pub distance: f64,
}

impl Phase {
    /// Distance covered `elapsed` seconds into the phase
    pub fn distance_at(&self, elapsed: f64) -> f64 {
        self.start_velocity * elapsed + 0.5 * self.acceleration * elapsed * elapsed
    }

    pub fn end_velocity(&self) -> f64 {
        self.start_velocity + self.acceleration * self.duration
    }
}

/// A solved kinematic profile for one bracket
#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    mode: MotionMode,
    time: f64,
    distance: f64,
    phases: [Phase; 3],
    /// Cumulative distance at the start of each phase
    starts: [f64; 3],
}

impl Motion {
    /// Constant velocity `distance / time`
    pub fn constant(time: f64, distance: f64) -> Result<Self> {
        check_bracket(time, distance)?;
        let velocity = distance / time;
        let idle = Phase {
            start_velocity: velocity,
            ..Default::default()
        };
        let cruise = Phase {
            duration: time,
            start_velocity: velocity,
            acceleration: 0.0,
            distance,
        };
        Ok(Self::from_phases(
            MotionMode::Constant,
            time,
            distance,
            [idle, cruise, idle],
        ))
    }

    /// Symmetric profile: accelerate for half the time, decelerate for the other half
    pub fn calculated(time: f64, distance: f64, velocity_in: f64, velocity_out: f64) -> Result<Self> {
        check_bracket(time, distance)?;
        let half = time * 0.5;
        let peak = 2.0 * distance / time - 0.5 * (velocity_in + velocity_out);
        if peak < -MOTION_EPSILON * distance.max(1.0) {
            trace!(time, distance, velocity_in, velocity_out, peak, "calculated profile has negative peak");
            return Err(unsatisfiable(time, distance, velocity_in, velocity_out));
        }
        let peak = peak.max(0.0);

        let d1 = 0.5 * (velocity_in + peak) * half;
        let accelerate = Phase {
            duration: half,
            start_velocity: velocity_in,
            acceleration: (peak - velocity_in) / half,
            distance: d1,
        };
        let cruise = Phase {
            start_velocity: peak,
            ..Default::default()
        };
        let decelerate = Phase {
            duration: half,
            start_velocity: peak,
            acceleration: (velocity_out - peak) / half,
            distance: (distance - d1).max(0.0),
        };
        Ok(Self::from_phases(
            MotionMode::Calculated,
            time,
            distance,
            [accelerate, cruise, decelerate],
        ))
    }

    /// Profile with caller-supplied accelerations
    ///
    /// `velocity_in` overrides `params.velocity_in`; the track passes the
    /// previous bracket's exit velocity here when chaining.
    pub fn explicit(
        time: f64,
        distance: f64,
        params: &KinematicParams,
        velocity_in: f64,
    ) -> Result<Self> {
        check_bracket(time, distance)?;
        let velocity_out = params.velocity_out;

        for (attempt, &(sign_in, sign_out)) in SIGN_COMBINATIONS.iter().enumerate() {
            // Flipping an ignored phase repeats an earlier attempt
            if (params.ignore_in && sign_in < 0.0) || (params.ignore_out && sign_out < 0.0) {
                continue;
            }

            let inverse_in = if params.ignore_in {
                0.0
            } else {
                1.0 / (sign_in * params.acceleration_in)
            };
            let inverse_out = if params.ignore_out {
                0.0
            } else {
                1.0 / (sign_out * params.acceleration_out)
            };

            let solver = ProfileSolver {
                time,
                distance,
                velocity_in,
                velocity_out,
                inverse_in,
                inverse_out,
                ignore_in: params.ignore_in,
                ignore_out: params.ignore_out,
            };

            match solver.solve() {
                Some(phases) => {
                    if attempt > 0 {
                        warn!(
                            time,
                            distance,
                            sign_in,
                            sign_out,
                            "kinematic segment solved only with flipped acceleration signs"
                        );
                    }
                    return Ok(Self::from_phases(MotionMode::Explicit, time, distance, phases));
                }
                None => trace!(attempt, sign_in, sign_out, "no valid profile for sign combination"),
            }
        }

        Err(unsatisfiable(time, distance, velocity_in, velocity_out))
    }

    /// Solve a bracket from kinematic parameters
    pub fn from_params(
        time: f64,
        distance: f64,
        params: &KinematicParams,
        velocity_in: f64,
    ) -> Result<Self> {
        params.validate()?;
        if params.calculate_accelerations {
            Self::calculated(time, distance, velocity_in, params.velocity_out)
        } else {
            Self::explicit(time, distance, params, velocity_in)
        }
    }

    fn from_phases(mode: MotionMode, time: f64, distance: f64, phases: [Phase; 3]) -> Self {
        let start_cruise = phases[0].distance_at(phases[0].duration);
        let start_decelerate = start_cruise + phases[1].distance_at(phases[1].duration);
        Self {
            mode,
            time,
            distance,
            phases,
            starts: [0.0, start_cruise, start_decelerate],
        }
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Accelerate, cruise and decelerate phases in order
    pub fn phases(&self) -> &[Phase; 3] {
        &self.phases
    }

    pub fn velocity_in(&self) -> f64 {
        self.phases[0].start_velocity
    }

    pub fn cruise_velocity(&self) -> f64 {
        self.phases[1].start_velocity
    }

    pub fn velocity_out(&self) -> f64 {
        self.phases[2].end_velocity().max(0.0)
    }

    /// Fraction of the distance covered after `elapsed` seconds, in [0, 1]
    pub fn percent(&self, elapsed: f64) -> f64 {
        if elapsed <= 0.0 {
            return 0.0;
        }
        if elapsed >= self.time {
            return 1.0;
        }
        if self.mode == MotionMode::Constant || self.distance <= DBL_EPSILON {
            return elapsed / self.time;
        }

        let mut local = elapsed;
        for (index, phase) in self.phases.iter().enumerate() {
            if local < phase.duration || index == self.phases.len() - 1 {
                let covered = self.starts[index] + phase.distance_at(local.min(phase.duration));
                return (covered / self.distance).clamp(0.0, 1.0);
            }
            local -= phase.duration;
        }
        1.0
    }

    /// Velocity after `elapsed` seconds
    pub fn velocity_at(&self, elapsed: f64) -> f64 {
        let mut local = elapsed.clamp(0.0, self.time);
        for (index, phase) in self.phases.iter().enumerate() {
            if local < phase.duration || index == self.phases.len() - 1 {
                let t = local.min(phase.duration);
                return (phase.start_velocity + phase.acceleration * t).max(0.0);
            }
            local -= phase.duration;
        }
        self.velocity_out()
    }
}

fn check_bracket(time: f64, distance: f64) -> Result<()> {
    if !time.is_finite() || time <= 0.0 {
        return Err(AnimationError::InvalidParameters(format!(
            "segment time must be positive, got {}",
            time
        )));
    }
    if !distance.is_finite() || distance < 0.0 {
        return Err(AnimationError::InvalidParameters(format!(
            "segment distance must be non-negative, got {}",
            distance
        )));
    }
    Ok(())
}

fn unsatisfiable(time: f64, distance: f64, velocity_in: f64, velocity_out: f64) -> AnimationError {
    AnimationError::Unsatisfiable {
        time,
        distance,
        velocity_in,
        velocity_out,
    }
}

/// One sign combination of the explicit-acceleration problem
///
/// Accelerations are carried as inverses so an ignored phase is simply a
/// zero inverse (an infinitely fast transition that takes no time).
struct ProfileSolver {
    time: f64,
    distance: f64,
    velocity_in: f64,
    velocity_out: f64,
    inverse_in: f64,
    inverse_out: f64,
    ignore_in: bool,
    ignore_out: bool,
}

impl ProfileSolver {
    fn solve(&self) -> Option<[Phase; 3]> {
        let (k1, k3) = (self.inverse_in, self.inverse_out);
        let (v1, v3) = (self.velocity_in, self.velocity_out);

        // t1 = (v2 - v1) k1, t3 = (v2 - v3) k3, d1 = (v2² - v1²) k1 / 2, d3 = (v2² - v3²) k3 / 2
        // and d1 + v2 (T - t1 - t3) + d3 = D, collected in powers of v2:
        let a = if self.ignore_in && self.ignore_out {
            0.0
        } else {
            -0.5 * (k1 + k3)
        };
        let b = self.time
            + if self.ignore_in { 0.0 } else { v1 * k1 }
            + if self.ignore_out { 0.0 } else { v3 * k3 };
        let c = -0.5
            * (if self.ignore_in { 0.0 } else { v1 * v1 * k1 }
                + if self.ignore_out { 0.0 } else { v3 * v3 * k3 })
            - self.distance;

        let roots = solve_quadratic(a, b, c);
        trace!(a, b, c, ?roots, "cruise velocity candidates");
        roots.into_iter().find_map(|v2| self.build(v2))
    }

    fn build(&self, v2: f64) -> Option<[Phase; 3]> {
        let distance_tolerance = MOTION_EPSILON * self.distance.max(1.0);
        let time_tolerance = MOTION_EPSILON * self.time.max(1.0);

        let v1 = if self.ignore_in { v2 } else { self.velocity_in };
        let v3 = if self.ignore_out { v2 } else { self.velocity_out };

        let t1 = (v2 - v1) * self.inverse_in;
        let t3 = (v2 - v3) * self.inverse_out;
        let t2 = self.time - t1 - t3;

        let d1 = 0.5 * (v2 * v2 - v1 * v1) * self.inverse_in;
        let d2 = v2 * t2;
        let d3 = self.distance - d1 - d2;
        let d3_calc = 0.5 * (v2 * v2 - v3 * v3) * self.inverse_out;

        let times_valid = [t1, t2, t3].iter().all(|t| *t >= -time_tolerance);
        let distances_valid = [d1, d2, d3].iter().all(|d| *d >= -distance_tolerance);
        let velocities_valid = [v1, v2, v3].iter().all(|v| *v >= -distance_tolerance);
        let closed = (d3 - d3_calc).abs() <= distance_tolerance;

        if !(times_valid && distances_valid && velocities_valid && closed) {
            trace!(v2, t1, t2, t3, d1, d2, d3, d3_calc, "rejected cruise velocity");
            return None;
        }

        let v2 = v2.max(0.0);
        let acceleration_in = if self.inverse_in == 0.0 {
            0.0
        } else {
            1.0 / self.inverse_in
        };
        let acceleration_out = if self.inverse_out == 0.0 {
            0.0
        } else {
            -1.0 / self.inverse_out
        };

        Some([
            Phase {
                duration: t1.max(0.0),
                start_velocity: v1.max(0.0),
                acceleration: acceleration_in,
                distance: d1.max(0.0),
            },
            Phase {
                duration: t2.max(0.0),
                start_velocity: v2,
                acceleration: 0.0,
                distance: d2.max(0.0),
            },
            Phase {
                duration: t3.max(0.0),
                start_velocity: v2,
                acceleration: acceleration_out,
                distance: d3.max(0.0),
            },
        ])
    }
}

/// Real roots of `a x² + b x + c = 0` in ascending order
fn solve_quadratic(a: f64, b: f64, c: f64) -> SmallVec<[f64; 2]> {
    let mut roots = SmallVec::new();

    if a.abs() <= DBL_EPSILON {
        if b.abs() > DBL_EPSILON {
            roots.push(-c / b);
        }
        return roots;
    }

    let mut discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        // Tangent solutions can come out marginally negative
        if discriminant > -MOTION_EPSILON * (b * b).max(1.0) {
            discriminant = 0.0;
        } else {
            return roots;
        }
    }

    // Numerically stable form avoiding cancellation between b and the root
    let q = -0.5 * (b + b.signum() * discriminant.sqrt());
    let first = q / a;
    roots.push(first);
    if q != 0.0 {
        let second = c / q;
        if second != first {
            roots.push(second);
        }
    }
    roots.sort_by(|x, y| x.total_cmp(y));
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_closed(motion: &Motion) {
        let phases = motion.phases();
        let total_time: f64 = phases.iter().map(|p| p.duration).sum();
        let total_distance: f64 = phases.iter().map(|p| p.distance).sum();
        assert_abs_diff_eq!(total_time, motion.time(), epsilon = 1e-6);
        assert_abs_diff_eq!(total_distance, motion.distance(), epsilon = 1e-6);
        for phase in phases {
            assert!(phase.duration >= 0.0);
            assert!(phase.distance >= 0.0);
            assert!(phase.start_velocity >= 0.0);
        }
        assert_eq!(motion.percent(0.0), 0.0);
        assert_eq!(motion.percent(motion.time()), 1.0);
    }

    fn assert_monotonic(motion: &Motion) {
        let mut last = 0.0;
        for step in 0..=1000 {
            let t = motion.time() * step as f64 / 1000.0;
            let p = motion.percent(t);
            assert!(p >= last, "percent dropped at t={}: {} < {}", t, p, last);
            last = p;
        }
    }

    #[test]
    fn test_constant_velocity_scenario() {
        let motion = Motion::constant(10.0, 100.0).unwrap();
        assert_eq!(motion.percent(2.5), 0.25);
        assert_eq!(motion.percent(5.0), 0.5);
        assert_eq!(motion.velocity_in(), 10.0);
        assert_eq!(motion.velocity_out(), 10.0);
        assert_closed(&motion);
    }

    #[test]
    fn test_percent_clamps_outside_bracket() {
        let motion = Motion::constant(4.0, 8.0).unwrap();
        assert_eq!(motion.percent(-1.0), 0.0);
        assert_eq!(motion.percent(100.0), 1.0);
    }

    #[test]
    fn test_explicit_symmetric_profile() {
        let params = KinematicParams::new(2.0, 2.0);
        let motion = Motion::explicit(10.0, 40.0, &params, 0.0).unwrap();
        assert_eq!(motion.mode(), MotionMode::Explicit);
        assert_abs_diff_eq!(motion.cruise_velocity(), 10.0 - 20f64.sqrt(), epsilon = 1e-9);
        let phases = motion.phases();
        assert_abs_diff_eq!(phases[0].duration, phases[2].duration, epsilon = 1e-9);
        assert_abs_diff_eq!(motion.velocity_out(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(motion.percent(5.0), 0.5, epsilon = 1e-9);
        assert_closed(&motion);
        assert_monotonic(&motion);
    }

    #[test]
    fn test_explicit_with_entry_velocity() {
        let params = KinematicParams::new(2.0, 2.0);
        let motion = Motion::explicit(10.0, 60.0, &params, 5.0).unwrap();
        assert_eq!(motion.velocity_in(), 5.0);
        assert!(motion.cruise_velocity() > 5.0);
        assert_closed(&motion);
        assert_monotonic(&motion);
    }

    #[test]
    fn test_tangent_solution() {
        // Enter at 20 and spend the whole bracket decelerating to rest
        let params = KinematicParams::new(2.0, 2.0);
        let motion = Motion::explicit(10.0, 100.0, &params, 20.0).unwrap();
        assert_abs_diff_eq!(motion.cruise_velocity(), 20.0, epsilon = 1e-6);
        assert_abs_diff_eq!(motion.phases()[2].duration, 10.0, epsilon = 1e-6);
        assert_closed(&motion);
    }

    #[test]
    fn test_sign_flip_retry() {
        // Entering fast over a short distance needs phase one to slow down
        let params = KinematicParams::new(2.0, 2.0);
        let motion = Motion::explicit(10.0, 30.0, &params, 10.0).unwrap();
        let phases = motion.phases();
        assert!(phases[0].acceleration < 0.0);
        assert_abs_diff_eq!(motion.cruise_velocity(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(phases[0].duration, 4.5, epsilon = 1e-9);
        assert_abs_diff_eq!(phases[2].duration, 0.5, epsilon = 1e-9);
        assert_closed(&motion);
        assert_monotonic(&motion);
    }

    #[test]
    fn test_exit_sign_flip_retry() {
        // Leaving faster than any cruise that fits needs phase three to speed up
        let params = KinematicParams::new(2.0, 2.0).with_velocities(0.0, 10.0);
        let motion = Motion::explicit(10.0, 45.0, &params, 0.0).unwrap();
        let phases = motion.phases();
        assert!(phases[0].acceleration > 0.0);
        assert!(phases[2].acceleration > 0.0);
        assert_abs_diff_eq!(motion.cruise_velocity(), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(phases[0].duration, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(phases[2].duration, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(motion.velocity_out(), 10.0, epsilon = 1e-9);
        assert_closed(&motion);
        assert_monotonic(&motion);
    }

    #[test]
    fn test_unsatisfiable_after_all_sign_combinations() {
        // At 1 u/s² from and to rest, 10 s covers at most 25 units
        let params = KinematicParams::new(1.0, 1.0);
        let err = Motion::explicit(10.0, 100.0, &params, 0.0).unwrap_err();
        assert!(matches!(err, AnimationError::Unsatisfiable { .. }));
    }

    #[test]
    fn test_ignore_out_leaves_at_cruise() {
        let params = KinematicParams {
            acceleration_in: 2.0,
            ignore_out: true,
            ..Default::default()
        };
        let motion = Motion::explicit(10.0, 50.0, &params, 0.0).unwrap();
        assert_eq!(motion.phases()[2].duration, 0.0);
        assert_abs_diff_eq!(motion.velocity_out(), motion.cruise_velocity(), epsilon = 1e-9);
        assert_abs_diff_eq!(motion.cruise_velocity(), 20.0 - 200f64.sqrt(), epsilon = 1e-9);
        assert_closed(&motion);
        assert_monotonic(&motion);
    }

    #[test]
    fn test_ignore_in_enters_at_cruise() {
        let params = KinematicParams {
            acceleration_out: 2.0,
            ignore_in: true,
            ..Default::default()
        };
        let motion = Motion::explicit(10.0, 50.0, &params, 0.0).unwrap();
        assert_eq!(motion.phases()[0].duration, 0.0);
        assert_abs_diff_eq!(motion.velocity_in(), motion.cruise_velocity());
        assert_abs_diff_eq!(motion.velocity_out(), 0.0, epsilon = 1e-9);
        assert_closed(&motion);
        assert_monotonic(&motion);
    }

    #[test]
    fn test_ignore_both_is_constant_velocity() {
        let params = KinematicParams {
            ignore_in: true,
            ignore_out: true,
            ..Default::default()
        };
        let motion = Motion::explicit(8.0, 40.0, &params, 0.0).unwrap();
        assert_abs_diff_eq!(motion.cruise_velocity(), 5.0);
        assert_abs_diff_eq!(motion.percent(2.0), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_calculated_profile() {
        let motion = Motion::calculated(10.0, 100.0, 0.0, 0.0).unwrap();
        assert_eq!(motion.mode(), MotionMode::Calculated);
        assert_abs_diff_eq!(motion.cruise_velocity(), 20.0);
        assert_abs_diff_eq!(motion.phases()[0].acceleration, 4.0);
        assert_abs_diff_eq!(motion.phases()[2].acceleration, -4.0);
        assert_abs_diff_eq!(motion.percent(5.0), 0.5, epsilon = 1e-12);
        assert_closed(&motion);
        assert_monotonic(&motion);
    }

    #[test]
    fn test_calculated_rejects_negative_peak() {
        // Boundary velocities alone overshoot the distance
        let err = Motion::calculated(10.0, 10.0, 50.0, 50.0).unwrap_err();
        assert!(matches!(err, AnimationError::Unsatisfiable { .. }));
    }

    #[test]
    fn test_zero_distance() {
        let params = KinematicParams::new(1.0, 1.0);
        let motion = Motion::explicit(5.0, 0.0, &params, 0.0).unwrap();
        assert_eq!(motion.percent(0.0), 0.0);
        assert_abs_diff_eq!(motion.percent(2.5), 0.5);
        assert_eq!(motion.percent(5.0), 1.0);
    }

    #[test]
    fn test_invalid_bracket() {
        assert!(matches!(
            Motion::constant(0.0, 1.0),
            Err(AnimationError::InvalidParameters(_))
        ));
        assert!(matches!(
            Motion::constant(1.0, -1.0),
            Err(AnimationError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_velocity_at_follows_phases() {
        let motion = Motion::calculated(10.0, 100.0, 0.0, 0.0).unwrap();
        assert_abs_diff_eq!(motion.velocity_at(0.0), 0.0);
        assert_abs_diff_eq!(motion.velocity_at(2.5), 10.0);
        assert_abs_diff_eq!(motion.velocity_at(5.0), 20.0);
        assert_abs_diff_eq!(motion.velocity_at(10.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_quadratic() {
        let roots = solve_quadratic(1.0, -3.0, 2.0);
        assert_eq!(roots.as_slice(), &[1.0, 2.0]);
        let roots = solve_quadratic(0.0, 2.0, -4.0);
        assert_eq!(roots.as_slice(), &[2.0]);
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
        let roots = solve_quadratic(1.0, -2.0, 1.0);
        assert_eq!(roots.as_slice(), &[1.0]);
    }
}
