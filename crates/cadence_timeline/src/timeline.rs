// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline: root of the track/clip/effect hierarchy.

use crate::clip::{Clip, ClipId};
use crate::engine::AutomationEngine;
use crate::error::EngineError;
use crate::span::FrameSpan;
use crate::track::{Track, TrackId};
use cadence_automation::{Automatable, AutomationData};
use indexmap::IndexMap;

/// Default frame rate for new timelines
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Default length of an empty timeline, in frames
pub const DEFAULT_DURATION: i64 = 300;

/// A timeline of tracks
#[derive(Debug)]
pub struct Timeline {
    /// Timeline name
    pub name: String,
    /// Frames per second, used by playback drivers
    pub frame_rate: f64,
    play_head: i64,
    max_duration: i64,
    tracks: IndexMap<TrackId, Track>,
    automation: AutomationData<()>,
    state: (),
}

impl Timeline {
    /// Create an empty timeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frame_rate: DEFAULT_FRAME_RATE,
            play_head: 0,
            max_duration: DEFAULT_DURATION,
            tracks: IndexMap::new(),
            automation: AutomationData::new(),
            state: (),
        }
    }

    /// Current play head frame
    pub fn play_head(&self) -> i64 {
        self.play_head
    }

    /// Move the play head. The frame must lie in `[0, max_duration)`.
    pub fn set_play_head(&mut self, frame: i64) -> Result<(), EngineError> {
        if frame < 0 || frame >= self.max_duration() {
            return Err(EngineError::InvalidPlayHead(frame));
        }
        self.play_head = frame;
        Ok(())
    }

    /// Length in frames; never shorter than the furthest clip
    pub fn max_duration(&self) -> i64 {
        let content = self.tracks.values().map(Track::end_frame).max().unwrap_or(0);
        self.max_duration.max(content)
    }

    /// Set the minimum length in frames. The play head is pulled back onto
    /// the last frame if the timeline became shorter than it.
    pub fn set_max_duration(&mut self, frames: i64) {
        self.max_duration = frames.max(0);
        let last = (self.max_duration() - 1).max(0);
        if self.play_head > last {
            self.play_head = last;
        }
    }

    /// Add a track
    pub fn add_track(&mut self, track: Track) -> TrackId {
        let id = track.id();
        self.tracks.insert(id, track);
        id
    }

    /// Remove a track
    pub fn remove_track(&mut self, track_id: TrackId) -> Option<Track> {
        self.tracks.shift_remove(&track_id)
    }

    /// Get a track
    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Get a mutable track
    pub fn track_mut(&mut self, track_id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&track_id)
    }

    /// Get all tracks
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub(crate) fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.values_mut()
    }

    /// Get track count
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Add a clip to a track
    pub fn add_clip(&mut self, track_id: TrackId, clip: Clip) -> Result<ClipId, EngineError> {
        self.tracks
            .get_mut(&track_id)
            .ok_or(EngineError::UnknownTrack(track_id))?
            .add_clip(clip)
    }

    /// Move or resize a clip on whichever track holds it.
    ///
    /// When the new span covers the play head and the track's automation is
    /// enabled, the clip is re-evaluated at its new local frame right away.
    pub fn set_clip_span(&mut self, clip_id: ClipId, span: FrameSpan) -> Result<(), EngineError> {
        let play_head = self.play_head;
        let track = self
            .tracks
            .values_mut()
            .find(|t| t.clip(clip_id).is_some())
            .ok_or(EngineError::UnknownClip(clip_id))?;
        track.set_clip_span(clip_id, span)?;

        if track.can_update_automation() && span.intersects(play_head) {
            if let Some(clip) = track.clip_mut(clip_id) {
                AutomationEngine::evaluate_clip(clip, play_head)?;
            }
        }
        Ok(())
    }

    /// Find a clip on any track
    pub fn find_clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.tracks.values().find_map(|t| t.clip(clip_id))
    }

    /// Timeline-level automation data
    pub fn automation(&self) -> &AutomationData<()> {
        &self.automation
    }

    /// Mutable timeline-level automation data
    pub fn automation_mut(&mut self) -> &mut AutomationData<()> {
        &mut self.automation
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new("Untitled Timeline")
    }
}

impl Automatable for Timeline {
    type State = ();

    fn automation_data(&self) -> &AutomationData<()> {
        &self.automation
    }

    fn automation_parts(&mut self) -> (&mut AutomationData<()>, &mut ()) {
        (&mut self.automation, &mut self.state)
    }
}
