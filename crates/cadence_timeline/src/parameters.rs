// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in automatable parameters of tracks, clips and effects.

use cadence_automation::{Parameter, ParameterRegistry, RegistryError};

/// Largest absolute rotation, in degrees
pub const MAX_ROTATION: f64 = 3600.0;

/// Largest absolute position component, in pixels
pub const MAX_POSITION: f32 = 100_000.0;

/// Largest absolute scale component
pub const MAX_SCALE: f32 = 100.0;

/// Handles to the built-in parameters
#[derive(Debug, Clone)]
pub struct TimelineParameters {
    /// `Track::Opacity`
    pub track_opacity: Parameter,
    /// `Track::IsVisible`
    pub track_visible: Parameter,
    /// `AudioTrack::Volume`
    pub track_volume: Parameter,
    /// `AudioTrack::IsMuted`
    pub track_muted: Parameter,
    /// `Clip::Opacity`
    pub clip_opacity: Parameter,
    /// `AudioClip::Volume`
    pub clip_volume: Parameter,
    /// `MotionEffect::Position`
    pub motion_position: Parameter,
    /// `MotionEffect::Scale`
    pub motion_scale: Parameter,
    /// `MotionEffect::Rotation`
    pub motion_rotation: Parameter,
}

impl TimelineParameters {
    /// Register the built-in parameters. Fails if any is already registered.
    pub fn register(registry: &ParameterRegistry) -> Result<Self, RegistryError> {
        let params = Self {
            track_opacity: registry.register_double("Track", "Opacity", 1.0, 0.0, 1.0)?,
            track_visible: registry.register_bool("Track", "IsVisible", true)?,
            track_volume: registry.register_float("AudioTrack", "Volume", 1.0, 0.0, 1.0)?,
            track_muted: registry.register_bool("AudioTrack", "IsMuted", false)?,
            clip_opacity: registry.register_double("Clip", "Opacity", 1.0, 0.0, 1.0)?,
            clip_volume: registry.register_float("AudioClip", "Volume", 1.0, 0.0, 1.0)?,
            motion_position: registry.register_vector2(
                "MotionEffect",
                "Position",
                [0.0, 0.0],
                [-MAX_POSITION, -MAX_POSITION],
                [MAX_POSITION, MAX_POSITION],
            )?,
            motion_scale: registry.register_vector2(
                "MotionEffect",
                "Scale",
                [1.0, 1.0],
                [-MAX_SCALE, -MAX_SCALE],
                [MAX_SCALE, MAX_SCALE],
            )?,
            motion_rotation: registry.register_double("MotionEffect", "Rotation", 0.0, -MAX_ROTATION, MAX_ROTATION)?,
        };
        tracing::debug!(count = registry.len(), "Registered timeline parameters");
        Ok(params)
    }
}
