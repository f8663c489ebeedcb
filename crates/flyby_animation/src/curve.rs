//! Center keyframes and the Bézier curves between them
//!
//! A center bracket is the cubic Bézier
//! `center_k → out_tangent_k → in_tangent_k+1 → center_k+1`, evaluated in an
//! unwrapped latitude/longitude plane anchored at `center_k`, so a bracket that
//! crosses the antimeridian stays continuous. Progress along the bracket is
//! measured in arc length: a fraction of the distance maps to a curve
//! parameter through a sampled length table.

use smallvec::SmallVec;

use flyby_core::{LatLon, Vector, Vector2};

/// Chords in the arc-length table
pub const ARC_SEGMENTS: usize = 32;

/// A center keyframe with its Bézier handles
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterKey {
    pub center: LatLon,
    /// Handle shaping the curve arriving at `center`
    pub in_tangent: LatLon,
    /// Handle shaping the curve leaving `center`
    pub out_tangent: LatLon,
}

impl CenterKey {
    pub fn new(center: LatLon, in_tangent: LatLon, out_tangent: LatLon) -> Self {
        Self {
            center,
            in_tangent,
            out_tangent,
        }
    }

    /// A key whose handles sit on the center, giving straight brackets
    pub fn linear(center: LatLon) -> Self {
        Self::new(center, center, center)
    }
}

/// Cubic Bézier between two center keyframes, parameterized by arc length
#[derive(Clone, Debug, PartialEq)]
pub struct CenterCurve {
    from: LatLon,
    to: LatLon,
    /// Control points in the plane anchored at `from`
    points: [Vector2; 4],
    /// Cumulative length at the end of each chord
    lengths: SmallVec<[f64; ARC_SEGMENTS]>,
}

impl CenterCurve {
    pub fn new(from: &CenterKey, to: &CenterKey) -> Self {
        let origin = from.center;
        let points = [
            from.center.to_plane(&origin),
            from.out_tangent.to_plane(&origin),
            to.in_tangent.to_plane(&origin),
            to.center.to_plane(&origin),
        ];

        let mut lengths = SmallVec::new();
        let mut previous = points[0];
        let mut total = 0.0;
        for step in 1..=ARC_SEGMENTS {
            let point = bezier(&points, step as f64 / ARC_SEGMENTS as f64);
            total += point.subtract(&previous).distance();
            lengths.push(total);
            previous = point;
        }

        Self {
            from: from.center,
            to: to.center,
            points,
            lengths,
        }
    }

    /// Arc length in degrees
    pub fn length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Curve parameter at which `fraction` of the arc length has been covered
    pub fn parameter_at_fraction(&self, fraction: f64) -> f64 {
        let total = self.length();
        if total <= 0.0 || fraction <= 0.0 {
            return fraction.clamp(0.0, 1.0);
        }
        if fraction >= 1.0 {
            return 1.0;
        }

        let target = fraction * total;
        let index = self
            .lengths
            .partition_point(|length| *length < target)
            .min(ARC_SEGMENTS - 1);
        let start = if index == 0 { 0.0 } else { self.lengths[index - 1] };
        let chord = self.lengths[index] - start;
        let local = if chord > 0.0 { (target - start) / chord } else { 0.0 };
        (index as f64 + local) / ARC_SEGMENTS as f64
    }

    /// Point on the curve after `fraction` of its arc length
    ///
    /// The end fractions return the keyframe centers exactly.
    pub fn position_at_fraction(&self, fraction: f64) -> LatLon {
        if fraction <= 0.0 {
            return self.from;
        }
        if fraction >= 1.0 {
            return self.to;
        }
        if self.length() <= 0.0 {
            return self.from.interpolate(&self.to, fraction);
        }
        LatLon::from_plane(&bezier(&self.points, self.parameter_at_fraction(fraction)))
    }

    /// Chord direction over the first table step
    pub fn entry_direction(&self) -> Vector2 {
        bezier(&self.points, 1.0 / ARC_SEGMENTS as f64) - self.points[0]
    }

    /// Chord direction over the last table step
    pub fn exit_direction(&self) -> Vector2 {
        self.points[3] - bezier(&self.points, 1.0 - 1.0 / ARC_SEGMENTS as f64)
    }
}

fn bezier(points: &[Vector2; 4], t: f64) -> Vector2 {
    let u = 1.0 - t;
    points[0] * (u * u * u)
        + points[1] * (3.0 * u * u * t)
        + points[2] * (3.0 * u * t * t)
        + points[3] * (t * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_straight_curve_is_uniform_in_distance() {
        let from = CenterKey::linear(LatLon::from_degrees(0.0, 0.0));
        let to = CenterKey::linear(LatLon::from_degrees(0.0, 10.0));
        let curve = CenterCurve::new(&from, &to);

        assert_abs_diff_eq!(curve.length(), 10.0, epsilon = 1e-9);
        // Handles on the centers bunch the raw parameter at the ends;
        // the arc-length table undoes that to within the chord resolution
        let mid = curve.position_at_fraction(0.5);
        assert_abs_diff_eq!(mid.longitude.degrees(), 5.0, epsilon = 0.05);
        assert_abs_diff_eq!(mid.latitude.degrees(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_endpoints_are_exact() {
        let from = CenterKey::new(
            LatLon::from_degrees(-27.5, 153.0),
            LatLon::from_degrees(-27.5, 153.0),
            LatLon::from_degrees(-29.0, 154.0),
        );
        let to = CenterKey::linear(LatLon::from_degrees(-33.9, 151.2));
        let curve = CenterCurve::new(&from, &to);
        assert_eq!(curve.position_at_fraction(0.0), from.center);
        assert_eq!(curve.position_at_fraction(1.0), to.center);
        assert_eq!(curve.parameter_at_fraction(1.0), 1.0);
    }

    #[test]
    fn test_curved_bracket_is_longer_than_chord() {
        let from = CenterKey::new(
            LatLon::from_degrees(0.0, 0.0),
            LatLon::from_degrees(0.0, 0.0),
            LatLon::from_degrees(5.0, 0.0),
        );
        let to = CenterKey::new(
            LatLon::from_degrees(0.0, 10.0),
            LatLon::from_degrees(5.0, 10.0),
            LatLon::from_degrees(0.0, 10.0),
        );
        let curve = CenterCurve::new(&from, &to);
        assert!(curve.length() > 10.0);
        assert!(curve.position_at_fraction(0.5).latitude.degrees() > 3.0);
    }

    #[test]
    fn test_crosses_antimeridian() {
        let from = CenterKey::linear(LatLon::from_degrees(0.0, 175.0));
        let to = CenterKey::linear(LatLon::from_degrees(0.0, -175.0));
        let curve = CenterCurve::new(&from, &to);
        assert_abs_diff_eq!(curve.length(), 10.0, epsilon = 1e-9);
        let mid = curve.position_at_fraction(0.5);
        assert!(mid.longitude.degrees().abs() > 179.0);
    }

    #[test]
    fn test_parameter_is_monotone() {
        let from = CenterKey::new(
            LatLon::from_degrees(10.0, 10.0),
            LatLon::from_degrees(10.0, 10.0),
            LatLon::from_degrees(20.0, 5.0),
        );
        let to = CenterKey::linear(LatLon::from_degrees(12.0, 30.0));
        let curve = CenterCurve::new(&from, &to);
        let mut last = 0.0;
        for step in 0..=50 {
            let t = curve.parameter_at_fraction(step as f64 / 50.0);
            assert!(t >= last);
            last = t;
        }
    }

    #[test]
    fn test_end_directions_follow_handles() {
        let from = CenterKey::new(
            LatLon::from_degrees(0.0, 0.0),
            LatLon::from_degrees(0.0, 0.0),
            LatLon::from_degrees(5.0, 0.0),
        );
        let to = CenterKey::new(
            LatLon::from_degrees(0.0, 10.0),
            LatLon::from_degrees(-5.0, 10.0),
            LatLon::from_degrees(0.0, 10.0),
        );
        let curve = CenterCurve::new(&from, &to);
        // Leaves heading north, arrives heading north from the southern handle
        assert!(curve.entry_direction().y > 0.0);
        assert!(curve.exit_direction().y > 0.0);
        assert!(curve.exit_direction().x < 0.05);
    }

    #[test]
    fn test_zero_length_bracket() {
        let key = CenterKey::linear(LatLon::from_degrees(1.0, 2.0));
        let curve = CenterCurve::new(&key, &key);
        assert_eq!(curve.length(), 0.0);
        assert_eq!(curve.position_at_fraction(0.5), key.center);
    }
}
