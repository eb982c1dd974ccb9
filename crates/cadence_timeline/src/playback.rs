// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-stepped playback driving the automation engine.

use crate::engine::{AutomationEngine, TickStats};
use crate::error::EngineError;
use crate::timeline::Timeline;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

/// Playback controller for a timeline
#[derive(Debug, Default)]
pub struct PlaybackController {
    /// Playback state
    pub state: PlaybackState,
    /// Wrap to the start instead of stopping at the end
    pub looping: bool,
    /// Loop start point (for loop range)
    pub loop_start: Option<i64>,
    /// Loop end point, exclusive (for loop range)
    pub loop_end: Option<i64>,
    engine: AutomationEngine,
}

impl PlaybackController {
    /// Create a new playback controller
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine ticked on every step
    pub fn engine(&self) -> &AutomationEngine {
        &self.engine
    }

    /// Step one frame forward and evaluate automation there.
    ///
    /// Returns `None` when not playing or when playback just ran off the end.
    pub fn advance(&mut self, timeline: &mut Timeline) -> Result<Option<TickStats>, EngineError> {
        if self.state != PlaybackState::Playing {
            return Ok(None);
        }

        let end = self.loop_end.unwrap_or_else(|| timeline.max_duration());
        let mut next = timeline.play_head() + 1;
        if next >= end {
            if self.looping || self.loop_end.is_some() {
                next = self.loop_start.unwrap_or(0);
            } else {
                self.state = PlaybackState::Stopped;
                tracing::info!(frame = timeline.play_head(), "Playback reached end");
                return Ok(None);
            }
        }

        timeline.set_play_head(next)?;
        self.engine.tick_current(timeline).map(Some)
    }

    /// Evaluate automation at the current play head without moving it
    pub fn refresh(&mut self, timeline: &mut Timeline) -> Result<TickStats, EngineError> {
        self.engine.tick_current(timeline)
    }

    /// Move the play head and evaluate automation there
    pub fn seek(&mut self, timeline: &mut Timeline, frame: i64) -> Result<TickStats, EngineError> {
        timeline.set_play_head(frame)?;
        self.engine.tick_current(timeline)
    }

    /// Set loop range `[start, end)`
    pub fn set_loop_range(&mut self, start: i64, end: i64) -> Result<(), EngineError> {
        if start < 0 || end <= start {
            return Err(EngineError::InvalidSpan {
                begin: start,
                duration: end - start,
            });
        }
        self.loop_start = Some(start);
        self.loop_end = Some(end);
        Ok(())
    }

    /// Clear loop range
    pub fn clear_loop_range(&mut self) {
        self.loop_start = None;
        self.loop_end = None;
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Play from current position
    pub fn play(&mut self) {
        if self.state != PlaybackState::Playing {
            tracing::info!("Playback started");
        }
        self.state = PlaybackState::Playing;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop and reset to the beginning
    pub fn stop(&mut self, timeline: &mut Timeline) -> Result<(), EngineError> {
        if self.state != PlaybackState::Stopped {
            tracing::info!(frame = timeline.play_head(), "Playback stopped");
        }
        self.state = PlaybackState::Stopped;
        timeline.set_play_head(self.loop_start.unwrap_or(0))
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_requires_playing() {
        let mut timeline = Timeline::new("Test");
        let mut playback = PlaybackController::new();

        assert!(playback.advance(&mut timeline).unwrap().is_none());
        assert_eq!(timeline.play_head(), 0);

        playback.play();
        assert!(playback.advance(&mut timeline).unwrap().is_some());
        assert_eq!(timeline.play_head(), 1);
        assert_eq!(playback.engine().last_frame(), Some(1));

        playback.toggle_playback();
        assert_eq!(playback.state, PlaybackState::Paused);
        assert!(playback.advance(&mut timeline).unwrap().is_none());
    }

    #[test]
    fn test_stops_at_end() {
        let mut timeline = Timeline::new("Test");
        timeline.set_max_duration(3);
        let mut playback = PlaybackController::new();
        playback.play();

        playback.advance(&mut timeline).unwrap();
        playback.advance(&mut timeline).unwrap();
        assert_eq!(timeline.play_head(), 2);
        assert!(playback.advance(&mut timeline).unwrap().is_none());
        assert_eq!(playback.state, PlaybackState::Stopped);
        assert_eq!(timeline.play_head(), 2);
    }

    #[test]
    fn test_loop_range_wraps() {
        let mut timeline = Timeline::new("Test");
        let mut playback = PlaybackController::new();
        playback.set_loop_range(10, 12).unwrap();
        playback.seek(&mut timeline, 10).unwrap();
        playback.play();

        playback.advance(&mut timeline).unwrap();
        assert_eq!(timeline.play_head(), 11);
        playback.advance(&mut timeline).unwrap();
        assert_eq!(timeline.play_head(), 10);
        assert!(playback.is_playing());

        playback.stop(&mut timeline).unwrap();
        assert_eq!(timeline.play_head(), 10);
        assert!(playback.set_loop_range(5, 5).is_err());
    }
}
