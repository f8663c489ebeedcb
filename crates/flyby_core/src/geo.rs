//! Geographic positions and zoom

use std::fmt;

use crate::angle::{Angle, Latitude, Longitude};
use crate::vector::Vector2;

/// A latitude/longitude pair
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLon {
    pub latitude: Latitude,
    pub longitude: Longitude,
}

impl LatLon {
    pub fn new(latitude: Latitude, longitude: Longitude) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self::new(
            Latitude::from_degrees(latitude),
            Longitude::from_degrees(longitude),
        )
    }

    /// Shortest-path `(dlat, dlon)` delta in degrees from `self` to `other`
    pub fn difference(&self, other: &LatLon) -> (f64, f64) {
        (
            self.latitude.difference(&other.latitude),
            self.longitude.difference(&other.longitude),
        )
    }

    /// Component-wise interpolation, longitude taking the short way round
    pub fn interpolate(&self, other: &LatLon, percent: f64) -> LatLon {
        LatLon::new(
            self.latitude.interpolate(&other.latitude, percent),
            self.longitude.interpolate(&other.longitude, percent),
        )
    }

    /// Planar angular distance in degrees over the shortest-path deltas
    pub fn angular_distance(&self, other: &LatLon) -> f64 {
        let (dlat, dlon) = self.difference(other);
        dlat.hypot(dlon)
    }

    /// Offset by raw degrees, re-normalizing both components
    pub fn offset(&self, dlat: f64, dlon: f64) -> LatLon {
        LatLon::new(
            self.latitude.add_degrees(dlat),
            self.longitude.add_degrees(dlon),
        )
    }

    /// Position relative to `origin` in an unwrapped plane (`x` = longitude, `y` = latitude)
    ///
    /// The longitude delta is the short-way delta, so points on either side of
    /// the antimeridian stay close together.
    pub fn to_plane(&self, origin: &LatLon) -> Vector2 {
        let (dlat, dlon) = origin.difference(self);
        Vector2::new(
            origin.longitude.degrees() + dlon,
            origin.latitude.degrees() + dlat,
        )
    }

    /// Inverse of [`LatLon::to_plane`]
    pub fn from_plane(point: &Vector2) -> LatLon {
        LatLon::from_degrees(point.y, point.x)
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.6}, {:.6})",
            self.latitude.degrees(),
            self.longitude.degrees()
        )
    }
}

/// Camera zoom
///
/// An unbounded scalar; the host decides how it maps onto eye distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Zoom(pub f64);

impl Zoom {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn difference(&self, other: &Zoom) -> f64 {
        other.0 - self.0
    }

    pub fn interpolate(&self, other: &Zoom, percent: f64) -> Zoom {
        Zoom(self.0 + (other.0 - self.0) * percent)
    }
}

impl From<f64> for Zoom {
    fn from(value: f64) -> Self {
        Zoom(value)
    }
}
