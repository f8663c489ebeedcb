//! Flyby Animation
//!
//! Keyframed camera paths over a globe.
//!
//! # Features
//!
//! - **Kinematic Segments**: three-phase accelerate / cruise / decelerate
//!   profiles with explicit or derived accelerations, sign-flip retries and
//!   velocity chaining between brackets
//! - **Spring Segments**: damped spring easing with a bisection search for
//!   the velocity cap that fills a bracket
//! - **Bézier Centers**: center brackets follow cubic curves, paced by arc length
//! - **Lazy Tracks**: keyframe edits mark a track dirty; the next query
//!   re-solves it in time order
//! - **Camera Paths**: four independent tracks (center, zoom, heading,
//!   pitch) sampled per frame

pub mod camera_path;
pub mod curve;
pub mod error;
pub mod motion;
pub mod params;
pub mod segment;
pub mod spring;
pub mod track;


pub use camera_path::CameraPath;
pub use curve::{CenterCurve, CenterKey};
pub use error::{AnimationError, Result};
pub use motion::{Motion, MotionMode, Phase, DBL_EPSILON, MOTION_EPSILON, SIGN_COMBINATIONS};
pub use params::{KinematicParams, MotionParams};
pub use segment::{SegmentMotion, SpringMotion};
pub use spring::{SpringParams, SpringSolver, SpringState, CONVERGENCE_EPSILON};
pub use track::{Keyframe, LinearSpan, Segment, Span, Track, TrackKind, TrackState, TrackValue};
