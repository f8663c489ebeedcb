//! Generic vector arithmetic
//!
//! The [`Vector`] trait is the numeric substrate shared by the planar curve
//! math and the spring solver. Implementors supply a handful of in-place
//! primitives; every operation then comes in three forms:
//!
//! - pure: `v.add(&w)` returns a new vector
//! - explicit output: `v.add_into(&w, &mut out)` writes into `out`
//! - in place: `v.add_local(&w)` mutates `v`
//!
//! `distance()` is the vector's length. Types whose notion of length covers
//! only some axes (see [`crate::TimeValue`]) override `distance()` and
//! `distance_squared()`; everything built on them follows automatically.

use std::fmt;

/// An N-dimensional vector over `f64`
pub trait Vector: Clone + Default + PartialEq + fmt::Debug {
    // ------------------------------------------------------------------------
    // Required primitives
    // ------------------------------------------------------------------------

    fn add_local(&mut self, other: &Self) -> &mut Self;

    fn subtract_local(&mut self, other: &Self) -> &mut Self;

    fn scale_local(&mut self, factor: f64) -> &mut Self;

    /// Component-wise minimum
    fn min_local(&mut self, other: &Self) -> &mut Self;

    /// Component-wise maximum
    fn max_local(&mut self, other: &Self) -> &mut Self;

    /// Squared length, avoiding the square root for comparisons
    fn distance_squared(&self) -> f64;

    // ------------------------------------------------------------------------
    // Provided operations
    // ------------------------------------------------------------------------

    /// A new zero vector
    fn create_new() -> Self {
        Self::default()
    }

    /// Copy `other` into `self`
    fn set(&mut self, other: &Self) -> &mut Self {
        self.clone_from(other);
        self
    }

    /// Length of the vector
    fn distance(&self) -> f64 {
        self.distance_squared().sqrt()
    }

    fn divide_local(&mut self, divisor: f64) -> &mut Self {
        self.scale_local(1.0 / divisor)
    }

    fn negate_local(&mut self) -> &mut Self {
        self.scale_local(-1.0)
    }

    /// Linear blend towards `other`; `percent` 0 keeps `self`, 1 yields `other`
    fn interpolate_local(&mut self, other: &Self, percent: f64) -> &mut Self {
        let mut delta = other.clone();
        delta.subtract_local(self).scale_local(percent);
        self.add_local(&delta)
    }

    /// Scale to unit length
    ///
    /// A zero-length vector stays the zero vector instead of dividing by zero.
    fn normalize_local(&mut self) -> &mut Self {
        let length = self.distance();
        if length == 0.0 || !length.is_finite() {
            let zero = Self::create_new();
            return self.set(&zero);
        }
        self.divide_local(length)
    }

    fn add(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.add_local(other);
        result
    }

    fn add_into(&self, other: &Self, store: &mut Self) {
        store.set(self).add_local(other);
    }

    fn subtract(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.subtract_local(other);
        result
    }

    fn subtract_into(&self, other: &Self, store: &mut Self) {
        store.set(self).subtract_local(other);
    }

    fn scale(&self, factor: f64) -> Self {
        let mut result = self.clone();
        result.scale_local(factor);
        result
    }

    fn scale_into(&self, factor: f64, store: &mut Self) {
        store.set(self).scale_local(factor);
    }

    fn divide(&self, divisor: f64) -> Self {
        let mut result = self.clone();
        result.divide_local(divisor);
        result
    }

    fn divide_into(&self, divisor: f64, store: &mut Self) {
        store.set(self).divide_local(divisor);
    }

    fn min(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.min_local(other);
        result
    }

    fn min_into(&self, other: &Self, store: &mut Self) {
        store.set(self).min_local(other);
    }

    fn max(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.max_local(other);
        result
    }

    fn max_into(&self, other: &Self, store: &mut Self) {
        store.set(self).max_local(other);
    }

    fn negate(&self) -> Self {
        let mut result = self.clone();
        result.negate_local();
        result
    }

    fn negate_into(&self, store: &mut Self) {
        store.set(self).negate_local();
    }

    fn interpolate(&self, other: &Self, percent: f64) -> Self {
        let mut result = self.clone();
        result.interpolate_local(other, percent);
        result
    }

    fn interpolate_into(&self, other: &Self, percent: f64, store: &mut Self) {
        store.set(self).interpolate_local(other, percent);
    }

    fn normalize(&self) -> Self {
        let mut result = self.clone();
        result.normalize_local();
        result
    }

    fn normalize_into(&self, store: &mut Self) {
        store.set(self).normalize_local();
    }
}

/// Implements [`Vector`] and the arithmetic operators for a struct of `f64` fields
macro_rules! component_vector {
    ($name:ident { $($field:ident),+ }) => {
        impl $name {
            pub const ZERO: $name = $name { $($field: 0.0),+ };

            pub fn new($($field: f64),+) -> Self {
                Self { $($field),+ }
            }

            /// Dot product
            pub fn dot(&self, other: &Self) -> f64 {
                0.0 $(+ self.$field * other.$field)+
            }
        }

        impl $crate::vector::Vector for $name {
            fn add_local(&mut self, other: &Self) -> &mut Self {
                $(self.$field += other.$field;)+
                self
            }

            fn subtract_local(&mut self, other: &Self) -> &mut Self {
                $(self.$field -= other.$field;)+
                self
            }

            fn scale_local(&mut self, factor: f64) -> &mut Self {
                $(self.$field *= factor;)+
                self
            }

            fn min_local(&mut self, other: &Self) -> &mut Self {
                $(self.$field = self.$field.min(other.$field);)+
                self
            }

            fn max_local(&mut self, other: &Self) -> &mut Self {
                $(self.$field = self.$field.max(other.$field);)+
                self
            }

            fn distance_squared(&self) -> f64 {
                0.0 $(+ self.$field * self.$field)+
            }
        }

        impl std::ops::Add for $name {
            type Output = $name;

            fn add(self, other: $name) -> $name {
                $name { $($field: self.$field + other.$field),+ }
            }
        }

        impl std::ops::Sub for $name {
            type Output = $name;

            fn sub(self, other: $name) -> $name {
                $name { $($field: self.$field - other.$field),+ }
            }
        }

        impl std::ops::Mul<f64> for $name {
            type Output = $name;

            fn mul(self, factor: f64) -> $name {
                $name { $($field: self.$field * factor),+ }
            }
        }

        impl std::ops::Neg for $name {
            type Output = $name;

            fn neg(self) -> $name {
                $name { $($field: -self.$field),+ }
            }
        }
    };
}

pub(crate) use component_vector;

/// One-dimensional vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector1 {
    pub x: f64,
}

component_vector!(Vector1 { x });

impl From<f64> for Vector1 {
    fn from(x: f64) -> Self {
        Self { x }
    }
}

/// Two-dimensional vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

component_vector!(Vector2 { x, y });

/// Three-dimensional vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

component_vector!(Vector3 { x, y, z });

impl Vector3 {
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}
