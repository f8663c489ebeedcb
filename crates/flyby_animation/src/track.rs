//! Keyframe tracks
//!
//! A [`Track`] is the time-sorted keyframe list of one animated quantity.
//! The first keyframe always sits at time zero and holds the initial value.
//! Every later keyframe owns the bracket that leads into it: the geometry
//! between the two values (a [`Span`]) and the solved [`SegmentMotion`].
//!
//! Tracks recompute lazily. Inserting or removing a keyframe discards every
//! solved bracket and moves the track to [`TrackState::Dirty`];
//! [`Track::refresh`] solves the brackets in time order and is the only way
//! back to [`TrackState::Clean`].

use std::fmt;

use tracing::{debug, trace};

use flyby_core::{Angle, Heading, LatLon, Pitch, Zoom};

use crate::curve::{CenterCurve, CenterKey};
use crate::error::{AnimationError, Result};
use crate::params::MotionParams;
use crate::segment::SegmentMotion;
use crate::spring::SpringSolver;

/// The animated quantities of a camera path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Center,
    Zoom,
    Heading,
    Pitch,
}

impl TrackKind {
    pub const ALL: [TrackKind; 4] = [
        TrackKind::Center,
        TrackKind::Zoom,
        TrackKind::Heading,
        TrackKind::Pitch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TrackKind::Center => "center",
            TrackKind::Zoom => "zoom",
            TrackKind::Heading => "heading",
            TrackKind::Pitch => "pitch",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a track's brackets reflect its keyframes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackState {
    /// Every bracket is solved
    Clean,
    /// Keyframes changed since the last refresh
    #[default]
    Dirty,
}

// ============================================================================
// Track values
// ============================================================================

/// Geometry travelled between two consecutive keyframe values
pub trait Span: Clone + fmt::Debug {
    type Output;

    /// Distance the segment solver has to cover
    fn length(&self) -> f64;

    /// Value after `fraction` of the length
    fn at(&self, fraction: f64) -> Self::Output;

    /// Whether `next` sets off in the direction this span arrives in
    ///
    /// Chained brackets only carry velocity across a keyframe when this holds.
    fn continues_into(&self, next: &Self) -> bool;
}

/// A value that can be keyframed on a track
pub trait TrackValue: Clone + fmt::Debug {
    /// What sampling the track yields
    type Output: Clone + fmt::Debug;
    type Span: Span<Output = Self::Output>;

    fn output(&self) -> Self::Output;

    fn span_to(&self, to: &Self) -> Self::Span;
}

/// Straight interpolation between two values
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearSpan<T> {
    pub from: T,
    pub to: T,
}

macro_rules! angle_track_value {
    ($($angle:ty),+) => {
        $(
            impl Span for LinearSpan<$angle> {
                type Output = $angle;

                fn length(&self) -> f64 {
                    self.from.distance(&self.to)
                }

                fn at(&self, fraction: f64) -> $angle {
                    self.from.interpolate(&self.to, fraction)
                }

                fn continues_into(&self, next: &Self) -> bool {
                    self.from.difference(&self.to) * next.from.difference(&next.to) > 0.0
                }
            }

            impl TrackValue for $angle {
                type Output = $angle;
                type Span = LinearSpan<$angle>;

                fn output(&self) -> $angle {
                    *self
                }

                fn span_to(&self, to: &$angle) -> LinearSpan<$angle> {
                    LinearSpan { from: *self, to: *to }
                }
            }
        )+
    };
}

angle_track_value!(Heading, Pitch);

impl Span for LinearSpan<Zoom> {
    type Output = Zoom;

    fn length(&self) -> f64 {
        self.from.difference(&self.to).abs()
    }

    fn at(&self, fraction: f64) -> Zoom {
        self.from.interpolate(&self.to, fraction)
    }

    fn continues_into(&self, next: &Self) -> bool {
        self.from.difference(&self.to) * next.from.difference(&next.to) > 0.0
    }
}

impl TrackValue for Zoom {
    type Output = Zoom;
    type Span = LinearSpan<Zoom>;

    fn output(&self) -> Zoom {
        *self
    }

    fn span_to(&self, to: &Zoom) -> LinearSpan<Zoom> {
        LinearSpan { from: *self, to: *to }
    }
}

impl Span for CenterCurve {
    type Output = LatLon;

    fn length(&self) -> f64 {
        CenterCurve::length(self)
    }

    fn at(&self, fraction: f64) -> LatLon {
        self.position_at_fraction(fraction)
    }

    fn continues_into(&self, next: &Self) -> bool {
        self.exit_direction().dot(&next.entry_direction()) > 0.0
    }
}

impl TrackValue for CenterKey {
    type Output = LatLon;
    type Span = CenterCurve;

    fn output(&self) -> LatLon {
        self.center
    }

    fn span_to(&self, to: &CenterKey) -> CenterCurve {
        CenterCurve::new(self, to)
    }
}

// ============================================================================
// Keyframes
// ============================================================================

/// A solved bracket
#[derive(Clone, Debug)]
pub struct Segment<T: TrackValue> {
    pub span: T::Span,
    pub motion: SegmentMotion,
}

/// A value anchored at a time, with the motion that leads into it
#[derive(Clone, Debug)]
pub struct Keyframe<T: TrackValue> {
    pub time: f64,
    pub value: T,
    pub params: MotionParams,
    segment: Option<Segment<T>>,
}

impl<T: TrackValue> Keyframe<T> {
    /// The bracket ending at this keyframe, once solved
    pub fn segment(&self) -> Option<&Segment<T>> {
        self.segment.as_ref()
    }
}

// ============================================================================
// Track
// ============================================================================

/// One animated quantity's keyframes and solved brackets
#[derive(Clone, Debug)]
pub struct Track<T: TrackValue> {
    kind: TrackKind,
    keyframes: Vec<Keyframe<T>>,
    state: TrackState,
}

impl<T: TrackValue> Track<T> {
    /// A track holding `initial` at time zero
    pub fn new(kind: TrackKind, initial: T) -> Self {
        Self {
            kind,
            keyframes: vec![Keyframe {
                time: 0.0,
                value: initial,
                params: MotionParams::Linear,
                segment: None,
            }],
            state: TrackState::Clean,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == TrackState::Dirty
    }

    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    /// Number of keyframes, including the initial one
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Time of the last keyframe
    pub fn duration(&self) -> f64 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// Insert a keyframe, replacing any keyframe at the same time
    ///
    /// A keyframe at time zero replaces the initial value; its parameters are
    /// unused since nothing leads into it.
    pub fn insert(&mut self, time: f64, value: T, params: MotionParams) -> Result<()> {
        if !time.is_finite() || time < 0.0 {
            return Err(AnimationError::InvalidTime(time));
        }
        params.validate()?;

        let keyframe = Keyframe {
            time,
            value,
            params,
            segment: None,
        };
        match self
            .keyframes
            .binary_search_by(|k| k.time.total_cmp(&time))
        {
            Ok(index) => {
                debug!(track = %self.kind, time, "replacing keyframe");
                self.keyframes[index] = keyframe;
            }
            Err(index) => {
                debug!(track = %self.kind, time, "adding keyframe");
                self.keyframes.insert(index, keyframe);
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Remove the keyframe at `time`, returning its value
    ///
    /// The initial keyframe cannot be removed.
    pub fn remove(&mut self, time: f64) -> Option<T> {
        let index = self
            .keyframes
            .iter()
            .position(|k| k.time == time)
            .filter(|index| *index > 0)?;
        debug!(track = %self.kind, time, "removing keyframe");
        let removed = self.keyframes.remove(index);
        self.invalidate();
        Some(removed.value)
    }

    /// Discard every solved bracket
    pub fn invalidate(&mut self) {
        for keyframe in &mut self.keyframes {
            keyframe.segment = None;
        }
        self.state = TrackState::Dirty;
    }

    /// Solve every bracket in time order if the track is dirty
    ///
    /// On error the track stays dirty and the error is returned on every
    /// query until the keyframes change.
    pub fn refresh(&mut self, solver: &SpringSolver) -> Result<()> {
        if self.state == TrackState::Clean {
            return Ok(());
        }
        for index in 1..self.keyframes.len() {
            self.refresh_segment(index, solver)?;
        }
        self.state = TrackState::Clean;
        debug!(track = %self.kind, keyframes = self.keyframes.len(), "track refreshed");
        Ok(())
    }

    /// Solve the bracket ending at keyframe `index`
    ///
    /// A bracket that takes its entry velocity from its predecessor requires
    /// the predecessor to be solved first.
    pub fn refresh_segment(&mut self, index: usize, solver: &SpringSolver) -> Result<()> {
        if index == 0 || index >= self.keyframes.len() {
            return Err(AnimationError::InvalidParameters(format!(
                "{} track has no bracket ending at keyframe {}",
                self.kind, index
            )));
        }

        let params = self.keyframes[index].params.clone();
        let from = &self.keyframes[index - 1];
        let to = &self.keyframes[index];
        let span = from.value.span_to(&to.value);

        let velocity_in = if params.uses_previous_for_in() {
            if index == 1 {
                // The initial keyframe is at rest
                0.0
            } else {
                match &from.segment {
                    Some(previous) if previous.span.continues_into(&span) => {
                        previous.motion.velocity_out()
                    }
                    Some(_) => {
                        // A reversal starts from rest
                        debug!(track = %self.kind, index, "chained bracket reverses, entering at rest");
                        0.0
                    }
                    None => {
                        return Err(AnimationError::UnsolvedPredecessor {
                            track: self.kind,
                            index,
                        })
                    }
                }
            }
        } else {
            match &params {
                MotionParams::Kinematic(kinematic) => kinematic.velocity_in,
                _ => 0.0,
            }
        };

        let time = to.time - from.time;
        let distance = span.length();
        trace!(track = %self.kind, index, time, distance, velocity_in, "solving bracket");

        let motion = SegmentMotion::solve(&params, time, distance, velocity_in, solver)?;
        self.keyframes[index].segment = Some(Segment { span, motion });
        Ok(())
    }

    /// Refresh if needed, then sample at `time`
    pub fn value_at(&mut self, time: f64, solver: &SpringSolver) -> Result<T::Output> {
        self.refresh(solver)?;
        self.sample(time)
    }

    /// Sample the solved brackets at `time`
    ///
    /// Times before the first keyframe hold the first value and times after
    /// the last keyframe hold the last value.
    pub fn sample(&self, time: f64) -> Result<T::Output> {
        if time.is_nan() {
            return Err(AnimationError::InvalidTime(time));
        }
        let (first, last) = match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(AnimationError::InvalidTime(time)),
        };
        if time <= first.time {
            return Ok(first.value.output());
        }
        if time >= last.time {
            return Ok(last.value.output());
        }

        let index = self.keyframes.partition_point(|k| k.time <= time);
        let from = &self.keyframes[index - 1];
        let to = &self.keyframes[index];
        let segment = to.segment.as_ref().ok_or(AnimationError::UnsolvedSegment {
            track: self.kind,
            index,
        })?;

        let percent = segment.motion.percent(time - from.time);
        trace!(track = %self.kind, time, index, percent, "sampling");
        if percent <= 0.0 {
            Ok(from.value.output())
        } else if percent >= 1.0 {
            Ok(to.value.output())
        } else {
            Ok(segment.span.at(percent))
        }
    }
}
