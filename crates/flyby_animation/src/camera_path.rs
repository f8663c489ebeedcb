//! Keyframed camera paths
//!
//! [`CameraPath`] aggregates four independent tracks (center, zoom, heading
//! and pitch). Each is keyframed on its own timeline; the path's length is
//! whichever track runs longest. Mutations only mark a track dirty, queries
//! refresh it before sampling.
//!
//! ```rust
//! use flyby_animation::{CameraPath, MotionParams};
//! use flyby_core::{Heading, LatLon, Pitch, Zoom};
//!
//! let start = LatLon::from_degrees(-27.47, 153.02);
//! let mut path = CameraPath::new(
//!     start,
//!     start,
//!     Zoom::new(12.0),
//!     Heading::from_degrees(0.0),
//!     Pitch::from_degrees(30.0),
//! );
//! path.add_center_linear(LatLon::from_degrees(-33.87, 151.21), 20.0, MotionParams::smooth())?;
//! path.add_zoom(Zoom::new(6.0), 10.0, MotionParams::linear())?;
//!
//! assert_eq!(path.time()?, 20.0);
//! assert_eq!(path.get_zoom(5.0)?, Zoom::new(9.0));
//! # Ok::<(), flyby_animation::AnimationError>(())
//! ```

use flyby_core::{CameraState, Heading, LatLon, Pitch, Zoom};
use tracing::debug;

use crate::curve::CenterKey;
use crate::error::Result;
use crate::params::MotionParams;
use crate::spring::SpringSolver;
use crate::track::{Track, TrackKind, TrackState};

/// A multi-track keyframed camera animation
#[derive(Clone, Debug)]
pub struct CameraPath {
    center: Track<CenterKey>,
    zoom: Track<Zoom>,
    heading: Track<Heading>,
    pitch: Track<Pitch>,
    solver: SpringSolver,
}

impl CameraPath {
    /// A path holding the initial camera at time zero
    ///
    /// `initial_out_tangent` shapes the first center bracket as it leaves
    /// `initial_center`.
    pub fn new(
        initial_center: LatLon,
        initial_out_tangent: LatLon,
        initial_zoom: Zoom,
        initial_heading: Heading,
        initial_pitch: Pitch,
    ) -> Self {
        Self {
            center: Track::new(
                TrackKind::Center,
                CenterKey::new(initial_center, initial_center, initial_out_tangent),
            ),
            zoom: Track::new(TrackKind::Zoom, initial_zoom),
            heading: Track::new(TrackKind::Heading, initial_heading),
            pitch: Track::new(TrackKind::Pitch, initial_pitch),
            solver: SpringSolver::default(),
        }
    }

    pub fn from_state(state: &CameraState) -> Self {
        Self::new(state.center, state.center, state.zoom, state.heading, state.pitch)
    }

    /// Use `solver` for spring brackets; every track is re-solved on the next query
    pub fn with_solver(mut self, solver: SpringSolver) -> Self {
        self.solver = solver;
        self.invalidate_all();
        self
    }

    pub fn solver(&self) -> &SpringSolver {
        &self.solver
    }

    fn invalidate_all(&mut self) {
        self.center.invalidate();
        self.zoom.invalidate();
        self.heading.invalidate();
        self.pitch.invalidate();
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Add a center keyframe with Bézier handles
    pub fn add_center(
        &mut self,
        center: LatLon,
        in_tangent: LatLon,
        out_tangent: LatLon,
        time: f64,
        params: MotionParams,
    ) -> Result<()> {
        self.center
            .insert(time, CenterKey::new(center, in_tangent, out_tangent), params)
    }

    /// Add a center keyframe reached along a straight bracket
    pub fn add_center_linear(&mut self, center: LatLon, time: f64, params: MotionParams) -> Result<()> {
        self.center.insert(time, CenterKey::linear(center), params)
    }

    pub fn add_zoom(&mut self, zoom: Zoom, time: f64, params: MotionParams) -> Result<()> {
        self.zoom.insert(time, zoom, params)
    }

    pub fn add_heading(&mut self, heading: Heading, time: f64, params: MotionParams) -> Result<()> {
        self.heading.insert(time, heading, params)
    }

    pub fn add_pitch(&mut self, pitch: Pitch, time: f64, params: MotionParams) -> Result<()> {
        self.pitch.insert(time, pitch, params)
    }

    pub fn remove_center(&mut self, time: f64) -> Option<LatLon> {
        self.center.remove(time).map(|key| key.center)
    }

    pub fn remove_zoom(&mut self, time: f64) -> Option<Zoom> {
        self.zoom.remove(time)
    }

    pub fn remove_heading(&mut self, time: f64) -> Option<Heading> {
        self.heading.remove(time)
    }

    pub fn remove_pitch(&mut self, time: f64) -> Option<Pitch> {
        self.pitch.remove(time)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get_center(&mut self, time: f64) -> Result<LatLon> {
        self.center.value_at(time, &self.solver)
    }

    pub fn get_zoom(&mut self, time: f64) -> Result<Zoom> {
        self.zoom.value_at(time, &self.solver)
    }

    pub fn get_heading(&mut self, time: f64) -> Result<Heading> {
        self.heading.value_at(time, &self.solver)
    }

    pub fn get_pitch(&mut self, time: f64) -> Result<Pitch> {
        self.pitch.value_at(time, &self.solver)
    }

    /// All four tracks sampled at `time`
    pub fn state_at(&mut self, time: f64) -> Result<CameraState> {
        Ok(CameraState::new(
            self.get_center(time)?,
            self.get_zoom(time)?,
            self.get_heading(time)?,
            self.get_pitch(time)?,
        ))
    }

    /// Total duration: the longest track's last keyframe time
    ///
    /// Refreshes dirty tracks, so an unsolvable bracket surfaces here too.
    pub fn time(&mut self) -> Result<f64> {
        self.refresh()?;
        Ok(self.duration())
    }

    /// Solve every dirty track
    pub fn refresh(&mut self) -> Result<()> {
        if self.is_dirty() {
            debug!("refreshing camera path");
        }
        self.center.refresh(&self.solver)?;
        self.zoom.refresh(&self.solver)?;
        self.heading.refresh(&self.solver)?;
        self.pitch.refresh(&self.solver)?;
        Ok(())
    }

    /// Whether any track needs refreshing
    pub fn is_dirty(&self) -> bool {
        TrackKind::ALL
            .iter()
            .any(|kind| self.track_state(*kind) == TrackState::Dirty)
    }

    pub fn track_state(&self, kind: TrackKind) -> TrackState {
        match kind {
            TrackKind::Center => self.center.state(),
            TrackKind::Zoom => self.zoom.state(),
            TrackKind::Heading => self.heading.state(),
            TrackKind::Pitch => self.pitch.state(),
        }
    }

    /// Keyframes on a track, including the initial one
    pub fn keyframe_count(&self, kind: TrackKind) -> usize {
        match kind {
            TrackKind::Center => self.center.len(),
            TrackKind::Zoom => self.zoom.len(),
            TrackKind::Heading => self.heading.len(),
            TrackKind::Pitch => self.pitch.len(),
        }
    }

    /// Last keyframe time on a track
    pub fn track_duration(&self, kind: TrackKind) -> f64 {
        match kind {
            TrackKind::Center => self.center.duration(),
            TrackKind::Zoom => self.zoom.duration(),
            TrackKind::Heading => self.heading.duration(),
            TrackKind::Pitch => self.pitch.duration(),
        }
    }

    fn duration(&self) -> f64 {
        TrackKind::ALL
            .iter()
            .map(|kind| self.track_duration(*kind))
            .fold(0.0, f64::max)
    }

    pub fn center_track(&self) -> &Track<CenterKey> {
        &self.center
    }

    pub fn zoom_track(&self) -> &Track<Zoom> {
        &self.zoom
    }

    pub fn heading_track(&self) -> &Track<Heading> {
        &self.heading
    }

    pub fn pitch_track(&self) -> &Track<Pitch> {
        &self.pitch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnimationError;
    use crate::spring::SpringParams;
    use approx::assert_abs_diff_eq;

    fn path() -> CameraPath {
        let start = LatLon::from_degrees(-27.5, 153.0);
        CameraPath::new(
            start,
            start,
            Zoom::new(10.0),
            Heading::from_degrees(0.0),
            Pitch::from_degrees(45.0),
        )
    }

    #[test]
    fn test_new_path_is_static() {
        let mut path = path();
        assert!(!path.is_dirty());
        assert_eq!(path.time().unwrap(), 0.0);
        let state = path.state_at(3.0).unwrap();
        assert_eq!(state.zoom, Zoom::new(10.0));
        assert_eq!(state.pitch, Pitch::from_degrees(45.0));
    }

    #[test]
    fn test_time_is_longest_track() {
        let mut path = path();
        path.add_zoom(Zoom::new(5.0), 8.0, MotionParams::linear()).unwrap();
        path.add_heading(Heading::from_degrees(90.0), 12.0, MotionParams::smooth())
            .unwrap();
        path.add_pitch(Pitch::from_degrees(10.0), 3.0, MotionParams::linear())
            .unwrap();
        assert_eq!(path.time().unwrap(), 12.0);
        assert_eq!(path.track_duration(TrackKind::Zoom), 8.0);
        assert_eq!(path.keyframe_count(TrackKind::Heading), 2);
        assert_eq!(path.keyframe_count(TrackKind::Center), 1);
    }

    #[test]
    fn test_mutation_dirties_only_its_track() {
        let mut path = path();
        path.add_zoom(Zoom::new(5.0), 8.0, MotionParams::linear()).unwrap();
        assert!(path.is_dirty());
        assert_eq!(path.track_state(TrackKind::Zoom), TrackState::Dirty);
        assert_eq!(path.track_state(TrackKind::Heading), TrackState::Clean);

        path.get_zoom(1.0).unwrap();
        assert!(!path.is_dirty());
    }

    #[test]
    fn test_tracks_hold_after_their_last_keyframe() {
        let mut path = path();
        path.add_zoom(Zoom::new(4.0), 2.0, MotionParams::linear()).unwrap();
        path.add_pitch(Pitch::from_degrees(0.0), 10.0, MotionParams::linear())
            .unwrap();
        let state = path.state_at(6.0).unwrap();
        assert_eq!(state.zoom, Zoom::new(4.0));
        assert_abs_diff_eq!(state.pitch.degrees(), 18.0, epsilon = 1e-9);
    }

    #[test]
    fn test_curved_center_bracket() {
        let mut path = path();
        path.add_center(
            LatLon::from_degrees(-27.5, 163.0),
            LatLon::from_degrees(-22.5, 163.0),
            LatLon::from_degrees(-27.5, 163.0),
            10.0,
            MotionParams::linear(),
        )
        .unwrap();
        let mid = path.get_center(5.0).unwrap();
        assert!(mid.latitude.degrees() > -27.5);
        assert_eq!(path.get_center(10.0).unwrap(), LatLon::from_degrees(-27.5, 163.0));
    }

    #[test]
    fn test_remove_restores_hold() {
        let mut path = path();
        path.add_heading(Heading::from_degrees(45.0), 5.0, MotionParams::linear())
            .unwrap();
        assert_eq!(path.remove_heading(5.0), Some(Heading::from_degrees(45.0)));
        assert_eq!(path.get_heading(2.0).unwrap(), Heading::from_degrees(0.0));
        assert_eq!(path.time().unwrap(), 0.0);
    }

    #[test]
    fn test_spring_zoom_bracket() {
        let mut path = path();
        path.add_zoom(Zoom::new(4.0), 10.0, MotionParams::spring(SpringParams::smooth()))
            .unwrap();
        let mut last = 10.0;
        for step in 0..=20 {
            let zoom = path.get_zoom(step as f64 * 0.5).unwrap().value();
            assert!(zoom <= last);
            last = zoom;
        }
        assert_eq!(path.get_zoom(10.0).unwrap(), Zoom::new(4.0));
    }

    #[test]
    fn test_error_surfaces_at_query_time() {
        let mut path = path();
        path.add_zoom(Zoom::new(4.0), 0.25, MotionParams::spring(SpringParams::smooth()))
            .unwrap();
        assert!(matches!(
            path.get_zoom(0.1),
            Err(AnimationError::SpringInfeasible { .. })
        ));
        assert!(path.time().is_err());
        // Other tracks are unaffected
        assert_eq!(path.get_pitch(0.1).unwrap(), Pitch::from_degrees(45.0));
    }

    #[test]
    fn test_with_solver_dirties_tracks() {
        let mut path = path();
        path.add_zoom(Zoom::new(4.0), 10.0, MotionParams::linear()).unwrap();
        path.refresh().unwrap();
        let solver = SpringSolver {
            time_step: 1.0 / 60.0,
            ..SpringSolver::default()
        };
        let mut path = path.with_solver(solver);
        assert!(path.is_dirty());
        assert_eq!(path.solver().time_step, 1.0 / 60.0);
        assert_eq!(path.keyframe_count(TrackKind::Zoom), 2);
        assert_eq!(path.get_zoom(5.0).unwrap(), Zoom::new(7.0));
    }

    #[test]
    fn test_invalid_keyframe_rejected() {
        let mut path = path();
        assert_eq!(
            path.add_zoom(Zoom::new(1.0), -2.0, MotionParams::linear()),
            Err(AnimationError::InvalidTime(-2.0))
        );
        assert!(path
            .add_heading(Heading::from_degrees(1.0), 2.0, MotionParams::eased(-1.0, 1.0))
            .is_err());
        assert!(!path.is_dirty());
    }
}
