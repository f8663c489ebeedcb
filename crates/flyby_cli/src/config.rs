//! Path file handling
//!
//! A path file (`flyby.toml` by default) describes the initial camera and the
//! keyframes of each track:
//!
//! ```toml
//! [initial]
//! zoom = 10.0
//! heading = 0.0
//! pitch = 45.0
//! center = { latitude = -27.5, longitude = 153.0 }
//!
//! [[center]]
//! time = 10.0
//! center = { latitude = -33.9, longitude = 151.2 }
//! motion = { kind = "kinematic", calculate_accelerations = true }
//!
//! [[zoom]]
//! time = 10.0
//! value = 4.0
//! ```
//!
//! `[[heading]]` and `[[pitch]]` mirror `[[zoom]]`. A keyframe without
//! `motion` moves at constant velocity.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use flyby_animation::{CameraPath, KinematicParams, MotionParams, SpringParams};
use flyby_core::{Heading, LatLon, Pitch, Zoom};

/// Default path file name
pub const PATH_FILE: &str = "flyby.toml";

/// A camera path description
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PathFile {
    pub initial: InitialCamera,
    #[serde(default)]
    pub center: Vec<CenterKeyframe>,
    #[serde(default)]
    pub zoom: Vec<ScalarKeyframe>,
    #[serde(default)]
    pub heading: Vec<ScalarKeyframe>,
    #[serde(default)]
    pub pitch: Vec<ScalarKeyframe>,
}

/// Camera at time zero
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InitialCamera {
    pub zoom: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub pitch: f64,
    pub center: LatLon,
    /// Handle leaving the initial center (defaults to the center)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_tangent: Option<LatLon>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CenterKeyframe {
    pub time: f64,
    pub center: LatLon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_tangent: Option<LatLon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_tangent: Option<LatLon>,
    #[serde(default)]
    pub motion: MotionParams,
}

/// A zoom, heading or pitch keyframe
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScalarKeyframe {
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub motion: MotionParams,
}

impl PathFile {
    /// Load a path file from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "No path file at {}. Run `flyby init` to create one.",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize path file")
    }

    /// Build the camera path, validating every keyframe
    pub fn build(&self) -> Result<CameraPath> {
        let center = self.initial.center;
        let mut path = CameraPath::new(
            center,
            self.initial.out_tangent.unwrap_or(center),
            Zoom::new(self.initial.zoom),
            Heading::from_degrees(self.initial.heading),
            Pitch::from_degrees(self.initial.pitch),
        );

        for key in &self.center {
            path.add_center(
                key.center,
                key.in_tangent.unwrap_or(key.center),
                key.out_tangent.unwrap_or(key.center),
                key.time,
                key.motion.clone(),
            )
            .with_context(|| format!("Invalid center keyframe at {}s", key.time))?;
        }
        for key in &self.zoom {
            path.add_zoom(Zoom::new(key.value), key.time, key.motion.clone())
                .with_context(|| format!("Invalid zoom keyframe at {}s", key.time))?;
        }
        for key in &self.heading {
            path.add_heading(Heading::from_degrees(key.value), key.time, key.motion.clone())
                .with_context(|| format!("Invalid heading keyframe at {}s", key.time))?;
        }
        for key in &self.pitch {
            path.add_pitch(Pitch::from_degrees(key.value), key.time, key.motion.clone())
                .with_context(|| format!("Invalid pitch keyframe at {}s", key.time))?;
        }

        Ok(path)
    }

    /// A short flyby touching every motion model, written by `flyby init`
    pub fn example() -> Self {
        Self {
            initial: InitialCamera {
                zoom: 12.0,
                heading: 0.0,
                pitch: 30.0,
                center: LatLon::from_degrees(-27.47, 153.02),
                out_tangent: Some(LatLon::from_degrees(-29.0, 153.5)),
            },
            center: vec![
                CenterKeyframe {
                    time: 15.0,
                    center: LatLon::from_degrees(-33.87, 151.21),
                    in_tangent: Some(LatLon::from_degrees(-32.5, 152.5)),
                    out_tangent: Some(LatLon::from_degrees(-35.0, 150.0)),
                    motion: MotionParams::smooth(),
                },
                CenterKeyframe {
                    time: 30.0,
                    center: LatLon::from_degrees(-37.81, 144.96),
                    in_tangent: None,
                    out_tangent: None,
                    motion: MotionParams::Kinematic(KinematicParams::new(0.5, 0.5).chained()),
                },
            ],
            zoom: vec![
                ScalarKeyframe {
                    time: 10.0,
                    value: 6.0,
                    motion: MotionParams::spring(SpringParams::smooth()),
                },
                ScalarKeyframe {
                    time: 30.0,
                    value: 12.0,
                    motion: MotionParams::smooth(),
                },
            ],
            heading: vec![ScalarKeyframe {
                time: 30.0,
                value: -135.0,
                motion: MotionParams::smooth(),
            }],
            pitch: vec![ScalarKeyframe {
                time: 20.0,
                value: 60.0,
                motion: MotionParams::linear(),
            }],
        }
    }
}
