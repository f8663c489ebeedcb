//! Angular quantity types
//!
//! Every angle stores its value in degrees and is normalized when it is
//! constructed, so an instance always satisfies its canonical range:
//!
//! | Type | Range | Difference |
//! |------|-------|------------|
//! | [`Latitude`] | (-90, 90] | linear |
//! | [`Longitude`] | (-180, 180] | shortest arc |
//! | [`Heading`] | (-180, 180] | shortest arc |
//! | [`Roll`] | (-180, 180] | shortest arc |
//! | [`Pitch`] | [0, 90] (clamped) | linear |
//!
//! Interpolating a wrapping angle walks the short way around the circle, so
//! heading 170° to -170° passes through 180° rather than back through 0°.

use std::fmt;

/// Wrap `degrees` into the half-open range `(-half_range, half_range]`.
///
/// Values already in range are returned untouched. Non-finite input is
/// returned as-is.
pub fn wrap_degrees(degrees: f64, half_range: f64) -> f64 {
    if degrees > -half_range && degrees <= half_range {
        return degrees;
    }
    if !degrees.is_finite() {
        return degrees;
    }

    let full_range = 2.0 * half_range;
    let mut wrapped = (degrees + half_range) % full_range;
    if wrapped <= 0.0 {
        wrapped += full_range;
    }

    // A tiny positive remainder can still round onto the excluded lower bound
    let result = wrapped - half_range;
    if result <= -half_range {
        result + full_range
    } else {
        result
    }
}

/// Behaviour shared by all angular quantity types
pub trait Angle: Copy + fmt::Debug {
    /// Construct from degrees, normalizing into the type's range
    fn from_degrees(degrees: f64) -> Self;

    /// Value in degrees, always within the type's range
    fn degrees(&self) -> f64;

    /// Value in radians
    fn radians(&self) -> f64 {
        self.degrees().to_radians()
    }

    /// Signed delta (degrees) that takes `self` to `other`
    ///
    /// For wrapping types this is the shortest-arc delta, itself normalized
    /// into the type's range.
    fn difference(&self, other: &Self) -> f64;

    /// `self + percent * difference(self, other)`, re-normalized
    fn interpolate(&self, other: &Self, percent: f64) -> Self {
        Self::from_degrees(self.degrees() + percent * self.difference(other))
    }

    /// Add a raw number of degrees, re-normalizing the result
    fn add_degrees(&self, degrees: f64) -> Self {
        Self::from_degrees(self.degrees() + degrees)
    }

    /// Absolute angular distance between two values
    fn distance(&self, other: &Self) -> f64 {
        self.difference(other).abs()
    }
}

macro_rules! angle_type {
    ($(#[$meta:meta])* $name:ident, range = ($min:expr, $max:expr), $normalize:expr, $difference:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(from = "f64", into = "f64")
        )]
        pub struct $name(f64);

        impl $name {
            /// Lower bound of the canonical range in degrees (excluded when the type wraps)
            pub const MIN_DEGREES: f64 = $min;

            /// Upper bound of the canonical range in degrees (always inclusive)
            pub const MAX_DEGREES: f64 = $max;

            pub const ZERO: $name = $name(0.0);

            /// Construct from degrees, normalizing into range
            pub fn from_degrees(degrees: f64) -> Self {
                let normalize: fn(f64) -> f64 = $normalize;
                Self(normalize(degrees))
            }

            /// Construct from radians, normalizing into range
            pub fn from_radians(radians: f64) -> Self {
                Self::from_degrees(radians.to_degrees())
            }

            /// Value in degrees
            pub fn degrees(&self) -> f64 {
                self.0
            }
        }

        impl Angle for $name {
            fn from_degrees(degrees: f64) -> Self {
                $name::from_degrees(degrees)
            }

            fn degrees(&self) -> f64 {
                self.0
            }

            fn difference(&self, other: &Self) -> f64 {
                let difference: fn(f64, f64) -> f64 = $difference;
                difference(self.0, other.0)
            }
        }

        impl From<f64> for $name {
            fn from(degrees: f64) -> Self {
                $name::from_degrees(degrees)
            }
        }

        impl From<$name> for f64 {
            fn from(angle: $name) -> f64 {
                angle.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}°", self.0)
            }
        }
    };
}

angle_type!(
    /// Latitude in degrees, normalized into (-90, 90]
    ///
    /// Differences are plain subtraction: walking across a pole by wrapping
    /// would teleport a camera to the opposite hemisphere.
    Latitude,
    range = (-90.0, 90.0),
    |d| wrap_degrees(d, 90.0),
    |from, to| to - from
);

angle_type!(
    /// Longitude in degrees, normalized into (-180, 180]
    Longitude,
    range = (-180.0, 180.0),
    |d| wrap_degrees(d, 180.0),
    |from, to| wrap_degrees(to - from, 180.0)
);

angle_type!(
    /// Camera heading in degrees, normalized into (-180, 180]
    Heading,
    range = (-180.0, 180.0),
    |d| wrap_degrees(d, 180.0),
    |from, to| wrap_degrees(to - from, 180.0)
);

angle_type!(
    /// Camera roll in degrees, normalized into (-180, 180]
    Roll,
    range = (-180.0, 180.0),
    |d| wrap_degrees(d, 180.0),
    |from, to| wrap_degrees(to - from, 180.0)
);

angle_type!(
    /// Camera pitch in degrees, clamped to [0, 90]
    ///
    /// Pitch does not wrap; interpolation is plain linear.
    Pitch,
    range = (0.0, 90.0),
    |d| if d.is_nan() { d } else { d.clamp(0.0, 90.0) },
    |from, to| to - from
);
