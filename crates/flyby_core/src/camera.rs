//! Camera state
//!
//! [`CameraState`] is what a host applies to its 3D view each frame.
//! [`CameraVector`] is the same quantity as a flat [`Vector`] so generic
//! solvers (the spring integrator in particular) can operate on a whole
//! camera at once.

use crate::angle::{Angle, Heading, Pitch};
use crate::geo::{LatLon, Zoom};
use crate::vector::component_vector;

/// A complete set of camera parameters
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraState {
    pub center: LatLon,
    pub zoom: Zoom,
    pub heading: Heading,
    pub pitch: Pitch,
}

impl CameraState {
    pub fn new(center: LatLon, zoom: Zoom, heading: Heading, pitch: Pitch) -> Self {
        Self {
            center,
            zoom,
            heading,
            pitch,
        }
    }

    /// Raw (already normalized) degrees and zoom as a vector
    pub fn to_vector(&self) -> CameraVector {
        CameraVector::new(
            self.center.latitude.degrees(),
            self.center.longitude.degrees(),
            self.zoom.value(),
            self.heading.degrees(),
            self.pitch.degrees(),
        )
    }

    /// Build a state from a vector, normalizing every angular component
    pub fn from_vector(vector: &CameraVector) -> Self {
        Self::new(
            LatLon::from_degrees(vector.latitude, vector.longitude),
            Zoom::new(vector.zoom),
            Heading::from_degrees(vector.heading),
            Pitch::from_degrees(vector.pitch),
        )
    }

    /// Shortest-path delta from `self` to `target`
    ///
    /// Adding this delta to `self.to_vector()` lands on a vector equivalent to
    /// `target` without crossing the long way round any wrapping angle.
    pub fn delta_to(&self, target: &CameraState) -> CameraVector {
        let (dlat, dlon) = self.center.difference(&target.center);
        CameraVector::new(
            dlat,
            dlon,
            self.zoom.difference(&target.zoom),
            self.heading.difference(&target.heading),
            self.pitch.difference(&target.pitch),
        )
    }

    /// Component-wise interpolation using each quantity's own rules
    pub fn interpolate(&self, target: &CameraState, percent: f64) -> CameraState {
        CameraState::new(
            self.center.interpolate(&target.center, percent),
            self.zoom.interpolate(&target.zoom, percent),
            self.heading.interpolate(&target.heading, percent),
            self.pitch.interpolate(&target.pitch, percent),
        )
    }
}

/// Camera parameters flattened into an unwrapped vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraVector {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub heading: f64,
    pub pitch: f64,
}

component_vector!(CameraVector {
    latitude,
    longitude,
    zoom,
    heading,
    pitch
});
