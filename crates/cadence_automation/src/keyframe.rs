// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions and interpolation.

use crate::value::AutomationValue;
use serde::{Deserialize, Serialize};

/// Interpolation mode from a keyframe to the next one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum InterpolationMode {
    /// Linear interpolation (booleans still step)
    #[default]
    Linear,
    /// Hold this keyframe's value until the next keyframe
    Hold,
    /// Linear with a power bend: blend = t^(1/|bend|)
    Curve {
        /// Bend amount, 0 is linear
        bend: f64,
    },
}

/// A keyframe in an automation sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    frame: i64,
    value: AutomationValue,
    #[serde(default)]
    interpolation: InterpolationMode,
}

impl Keyframe {
    /// Create a new keyframe
    pub fn new(frame: i64, value: AutomationValue) -> Self {
        Self {
            frame,
            value,
            interpolation: InterpolationMode::Linear,
        }
    }

    /// Set interpolation mode
    pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }

    /// Frame of this keyframe, in its owner's local frame space
    pub fn frame(&self) -> i64 {
        self.frame
    }

    /// Value at this keyframe
    pub fn value(&self) -> AutomationValue {
        self.value
    }

    /// Interpolation mode to the next keyframe
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    pub(crate) fn set_value(&mut self, value: AutomationValue) {
        self.value = value;
    }

    pub(crate) fn set_interpolation(&mut self, mode: InterpolationMode) {
        self.interpolation = mode;
    }

    /// Value at `frame`, which must lie in `[self.frame, next.frame]`
    pub fn interpolate(&self, next: &Keyframe, frame: i64) -> AutomationValue {
        if self.interpolation == InterpolationMode::Hold {
            return self.value;
        }
        let blend = Interpolation::blend(frame, self.frame, next.frame, self.interpolation);
        self.value.lerp(&next.value, blend).unwrap_or(self.value)
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Normalised position of `frame` between `frame_a` and `frame_b`.
    ///
    /// Returns 1.0 for a zero-width segment.
    pub fn blend(frame: i64, frame_a: i64, frame_b: i64, mode: InterpolationMode) -> f64 {
        let range = frame_b - frame_a;
        if range <= 0 {
            return 1.0;
        }

        let t = ((frame - frame_a) as f64 / range as f64).clamp(0.0, 1.0);
        match mode {
            InterpolationMode::Curve { bend } if bend != 0.0 => t.powf(1.0 / bend.abs()),
            _ => t,
        }
    }
}
