// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame spans: where a clip sits on the timeline.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Half-open range of frames `[begin, begin + duration)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct FrameSpan {
    begin: i64,
    duration: i64,
}

impl FrameSpan {
    /// Create a span. `begin` and `duration` must be non-negative and their
    /// sum must fit in an `i64`; an empty span covers no frame.
    pub fn new(begin: i64, duration: i64) -> Result<Self, EngineError> {
        if begin < 0 || duration < 0 || begin.checked_add(duration).is_none() {
            return Err(EngineError::InvalidSpan { begin, duration });
        }
        Ok(Self { begin, duration })
    }

    /// First frame
    pub fn begin(&self) -> i64 {
        self.begin
    }

    /// Length in frames
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// One past the last frame
    pub fn end(&self) -> i64 {
        self.begin + self.duration
    }

    /// Whether `frame` lies inside the span
    pub fn intersects(&self, frame: i64) -> bool {
        frame >= self.begin && frame < self.end()
    }

    /// Offset of a global frame from `begin`. May be out of range; `None`
    /// only when the offset does not fit in an `i64`.
    pub fn to_local(&self, frame: i64) -> Option<i64> {
        frame.checked_sub(self.begin)
    }

    /// Same duration, new begin
    pub fn moved_to(&self, begin: i64) -> Result<Self, EngineError> {
        Self::new(begin, self.duration)
    }
}

#[derive(Deserialize)]
struct RawSpan {
    begin: i64,
    duration: i64,
}

impl TryFrom<RawSpan> for FrameSpan {
    type Error = EngineError;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        Self::new(raw.begin, raw.duration)
    }
}
