//! Easing curves used by one-shot tweens.
//!
//! The cubic variants match the "power2" family used by common web tweening
//! libraries, which is what the presentation choreography is tuned against.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// Slow start, fast end.
    CubicIn,
    /// Fast start, slow end.
    #[default]
    CubicOut,
    CubicInOut,
}

impl Easing {
    /// Input is clamped to [0.0, 1.0]; output is in the same range.
    #[inline]
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Easing::Linear => t,
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt * omt
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
        }
    }
}
