// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline hierarchy and automation engine for Cadence.
//!
//! This crate provides the objects automation drives and the walk over them:
//! - Timeline, tracks, clips and effects
//! - Built-in automatable parameters
//! - The per-frame automation engine
//! - Frame-stepped playback
//! - Project and settings persistence
//!
//! ## Architecture
//!
//! Every owner in the hierarchy implements
//! [`cadence_automation::Automatable`]. [`AutomationEngine::tick`] evaluates
//! the timeline, then each enabled track, then each clip under the frame and
//! its effects, converting to clip-local frames on the way down.

pub mod clip;
pub mod effect;
pub mod engine;
pub mod error;
pub mod parameters;
pub mod playback;
pub mod project;
pub mod settings;
pub mod span;
pub mod timeline;
pub mod track;

pub use clip::{Clip, ClipId, ClipKind, ClipState};
pub use effect::{Effect, EffectId, EffectKind, MotionState};
pub use engine::{AutomationEngine, TickStats};
pub use error::EngineError;
pub use parameters::TimelineParameters;
pub use playback::{PlaybackController, PlaybackState};
pub use project::{PROJECT_FILE_EXTENSION, PROJECT_FORMAT_VERSION};
pub use settings::{EngineSettings, SETTINGS_ENV_VAR, SETTINGS_FORMAT_VERSION};
pub use span::FrameSpan;
pub use timeline::Timeline;
pub use track::{Track, TrackId, TrackKind, TrackState};
