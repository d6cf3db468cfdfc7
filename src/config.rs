use std::path::Path;

use anyhow::Context;
use glam::Vec3;
use serde::Deserialize;

use crate::math::Easing;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub viewport: ViewportConfig,
    pub camera: CameraConfig,
    pub zones: ZoneConfig,
    pub motion: MotionConfig,
    pub transitions: TransitionConfig,
}

impl PresentationConfig {
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        toml::from_str(source).context("Invalid presentation config")
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&source)
    }

    /// Height of the pinned region; defaults to the viewport height.
    pub fn pin_height(&self) -> f32 {
        self.zones.pin_height.unwrap_or(self.viewport.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    /// Multiplier on the exact-fit distance; values above 1 leave a border.
    pub margin: f32,
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            margin: 1.5,
            position: Vec3::new(0.0, 0.0, 5.0),
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Document offset of the pinned section, in pixels.
    pub trigger_zone_start: f32,
    pub pin_height: Option<f32>,
    /// End of the body-top zone whose backward re-entry restores floating.
    pub top_zone_end: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            trigger_zone_start: 1080.0,
            pin_height: None,
            top_zone_end: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub float_amplitude: f32,
    pub float_speed: f32,
    pub float_time_scale: f32,
    pub wobble_degrees: f32,
    pub wobble_time_scale: f32,
    /// Full X turns of the primary object across the scroll zone.
    pub primary_turns: f32,
    pub secondary_turns: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            float_amplitude: 5.0,
            float_speed: 1.5,
            float_time_scale: 0.01,
            wobble_degrees: 10.0,
            wobble_time_scale: 0.001,
            primary_turns: 1.0,
            secondary_turns: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case", tag = "style")]
pub enum IntroStyle {
    /// Only the presentation container (and optionally the object) scales in.
    #[default]
    Scale,
    /// Objects start displaced and tilted and glide to their resting pose.
    Converge {
        start_offset: Vec3,
        start_tilt: f32,
        secondary_rest_x: f32,
        secondary_delay_ms: f64,
    },
}

impl IntroStyle {
    pub fn converge() -> Self {
        IntroStyle::Converge {
            start_offset: Vec3::new(0.0, -500.0, 0.0),
            start_tilt: -0.9,
            secondary_rest_x: 450.0,
            secondary_delay_ms: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub appear_ms: f64,
    pub appear_easing: Easing,
    pub scale_object_on_appear: bool,
    pub intro: IntroStyle,
    pub scan_turn_ms: f64,
    pub scan_turn_easing: Easing,
    pub scan_shrink_ms: f64,
    pub scan_shrink_easing: Easing,
    /// Y the object snaps to when the scan starts.
    pub scan_baseline_y: f32,
    pub cue_delay_ms: f64,
    pub return_ms: f64,
    pub return_easing: Easing,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            appear_ms: 1000.0,
            appear_easing: Easing::CubicInOut,
            scale_object_on_appear: false,
            intro: IntroStyle::Scale,
            scan_turn_ms: 1000.0,
            scan_turn_easing: Easing::CubicInOut,
            scan_shrink_ms: 500.0,
            scan_shrink_easing: Easing::CubicIn,
            scan_baseline_y: 0.0,
            cue_delay_ms: 500.0,
            return_ms: 1000.0,
            return_easing: Easing::CubicOut,
        }
    }
}
