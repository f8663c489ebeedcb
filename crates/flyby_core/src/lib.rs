//! Flyby Core
//!
//! Value types for keyframed camera animation over a globe:
//!
//! - **Angles**: [`Latitude`], [`Longitude`], [`Heading`], [`Pitch`], [`Roll`],
//!   normalized on construction, with shortest-path difference and interpolation
//! - **Geography**: [`LatLon`] and [`Zoom`]
//! - **Vectors**: the [`Vector`] trait with pure, explicit-output and in-place
//!   forms of every operation, implemented by [`Vector1`], [`Vector2`],
//!   [`Vector3`], [`TimeValue`] and [`CameraVector`]
//!
//! # Example
//!
//! ```rust
//! use flyby_core::{Angle, Heading};
//!
//! let from = Heading::from_degrees(170.0);
//! let to = Heading::from_degrees(-170.0);
//!
//! // Interpolation goes the short way round, through 180°
//! let mid = from.interpolate(&to, 0.5);
//! assert!((mid.degrees() - 180.0).abs() < 1e-9);
//! ```

pub mod angle;
pub mod camera;
pub mod geo;
pub mod time_value;
pub mod vector;

pub use angle::{wrap_degrees, Angle, Heading, Latitude, Longitude, Pitch, Roll};
pub use camera::{CameraState, CameraVector};
pub use geo::{LatLon, Zoom};
pub use time_value::TimeValue;
pub use vector::{Vector, Vector1, Vector2, Vector3};
