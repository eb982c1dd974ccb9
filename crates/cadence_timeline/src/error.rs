// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the timeline and engine.

use crate::clip::ClipId;
use crate::track::TrackId;
use cadence_automation::{AutomationError, RegistryError};

/// Error raised while building, evaluating or persisting a timeline
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A clip was evaluated at a frame outside its span
    #[error("Frame {frame} is outside clip {clip:?} ({begin}..{begin}+{duration})")]
    FrameOutOfRange {
        /// The clip being evaluated
        clip: ClipId,
        /// Global frame requested
        frame: i64,
        /// First frame of the clip
        begin: i64,
        /// Clip length in frames
        duration: i64,
    },

    /// Automation failure
    #[error(transparent)]
    Automation(#[from] AutomationError),

    /// Parameter registration failure
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Span with a negative begin or duration
    #[error("Invalid frame span: begin {begin}, duration {duration}")]
    InvalidSpan {
        /// Requested begin
        begin: i64,
        /// Requested duration
        duration: i64,
    },

    /// Play head moved before frame zero or past the timeline's end
    #[error("Play head outside the timeline: {0}")]
    InvalidPlayHead(i64),

    /// No track with this id
    #[error("Unknown track: {0:?}")]
    UnknownTrack(TrackId),

    /// No clip with this id
    #[error("Unknown clip: {0:?}")]
    UnknownClip(ClipId),

    /// Clip kind does not fit the track kind
    #[error("Cannot place a {clip} clip on a {track} track")]
    KindMismatch {
        /// Clip kind name
        clip: &'static str,
        /// Track kind name
        track: &'static str,
    },

    /// Project or settings file could not be parsed or is too new
    #[error("Project error: {0}")]
    Project(String),

    /// File I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
