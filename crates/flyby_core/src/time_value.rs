//! Time/value pairs for keyframe curves

use crate::vector::Vector;

/// A sample on a one-dimensional curve over time
///
/// Arithmetic is component-wise over both axes, but the length of a
/// `TimeValue` measures only the time axis: spacing and fitting decisions
/// made through [`Vector::distance`] ignore how far the value moved.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeValue {
    pub time: f64,
    pub value: f64,
}

impl TimeValue {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

impl Vector for TimeValue {
    fn add_local(&mut self, other: &Self) -> &mut Self {
        self.time += other.time;
        self.value += other.value;
        self
    }

    fn subtract_local(&mut self, other: &Self) -> &mut Self {
        self.time -= other.time;
        self.value -= other.value;
        self
    }

    fn scale_local(&mut self, factor: f64) -> &mut Self {
        self.time *= factor;
        self.value *= factor;
        self
    }

    fn min_local(&mut self, other: &Self) -> &mut Self {
        self.time = self.time.min(other.time);
        self.value = self.value.min(other.value);
        self
    }

    fn max_local(&mut self, other: &Self) -> &mut Self {
        self.time = self.time.max(other.time);
        self.value = self.value.max(other.value);
        self
    }

    fn distance_squared(&self) -> f64 {
        self.time * self.time
    }

    fn distance(&self) -> f64 {
        self.time.abs()
    }
}
