// SPDX-License-Identifier: MIT OR Apache-2.0
//! Automation engine: walks the timeline and evaluates every owner at a frame.
//!
//! Timeline and track automation is keyed in global frames. Clip and effect
//! automation is keyed relative to the clip's begin frame, so a clip is only
//! evaluated while the frame lies inside its span.

use crate::clip::Clip;
use crate::error::EngineError;
use crate::timeline::Timeline;
use cadence_automation::evaluate_owner;
use std::ops::AddAssign;

/// What one evaluation pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Owners entered for evaluation
    pub owners_evaluated: usize,
    /// Sequences that wrote a value
    pub sequences_updated: usize,
    /// Clips whose span covered the frame
    pub clips_evaluated: usize,
}

impl AddAssign for TickStats {
    fn add_assign(&mut self, other: Self) {
        self.owners_evaluated += other.owners_evaluated;
        self.sequences_updated += other.sequences_updated;
        self.clips_evaluated += other.clips_evaluated;
    }
}

/// Drives automation for a timeline
#[derive(Debug, Default)]
pub struct AutomationEngine {
    ticks: u64,
    last_frame: Option<i64>,
}

impl AutomationEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Frame of the last completed tick
    pub fn last_frame(&self) -> Option<i64> {
        self.last_frame
    }

    /// Evaluate the timeline at its play head
    pub fn tick_current(&mut self, timeline: &mut Timeline) -> Result<TickStats, EngineError> {
        let frame = timeline.play_head();
        self.tick(timeline, frame)
    }

    /// Evaluate the whole timeline at a global `frame`
    pub fn tick(&mut self, timeline: &mut Timeline, frame: i64) -> Result<TickStats, EngineError> {
        let mut stats = TickStats {
            owners_evaluated: 1,
            sequences_updated: evaluate_owner(timeline, frame)?,
            clips_evaluated: 0,
        };

        for track in timeline.tracks_mut() {
            if !track.can_update_automation() {
                continue;
            }
            stats.owners_evaluated += 1;
            stats.sequences_updated += evaluate_owner(track, frame)?;

            for clip in track.clips_mut() {
                if clip.span().intersects(frame) {
                    stats += Self::evaluate_clip(clip, frame)?;
                }
            }
        }

        self.ticks += 1;
        self.last_frame = Some(frame);
        tracing::debug!(
            frame,
            owners = stats.owners_evaluated,
            sequences = stats.sequences_updated,
            clips = stats.clips_evaluated,
            "Automation tick"
        );
        Ok(stats)
    }

    /// Evaluate one clip and its effects at a global `frame`.
    ///
    /// Fails with [`EngineError::FrameOutOfRange`] unless the frame lies
    /// inside the clip's span.
    pub fn evaluate_clip(clip: &mut Clip, frame: i64) -> Result<TickStats, EngineError> {
        let span = clip.span();
        let relative = match span.to_local(frame) {
            Some(relative) if relative >= 0 && relative < span.duration() => relative,
            _ => {
                return Err(EngineError::FrameOutOfRange {
                    clip: clip.id(),
                    frame,
                    begin: span.begin(),
                    duration: span.duration(),
                })
            }
        };

        let mut stats = TickStats {
            owners_evaluated: 1,
            sequences_updated: evaluate_owner(clip, relative)?,
            clips_evaluated: 1,
        };
        for effect in clip.effects_mut() {
            stats.owners_evaluated += 1;
            stats.sequences_updated += evaluate_owner(effect, relative)?;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipId;
    use crate::effect::Effect;
    use crate::parameters::TimelineParameters;
    use crate::span::FrameSpan;
    use crate::track::{Track, TrackId};
    use cadence_automation::{AutomationValue, ParameterRegistry};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Scene {
        params: TimelineParameters,
        timeline: Timeline,
        track: TrackId,
        clip: ClipId,
    }

    fn scene() -> Scene {
        let registry = ParameterRegistry::new();
        let params = TimelineParameters::register(&registry).unwrap();
        let mut timeline = Timeline::new("Scene");
        let track = timeline.add_track(Track::video("V1", &params).unwrap());

        let mut clip = Clip::video("C", FrameSpan::new(100, 100).unwrap(), &params).unwrap();
        {
            let opacity = clip.automation_mut().sequence_mut(&params.clip_opacity).unwrap();
            opacity.add_key_frame(0, AutomationValue::Double(0.0)).unwrap();
            opacity.add_key_frame(99, AutomationValue::Double(1.0)).unwrap();
        }
        let clip = timeline.add_clip(track, clip).unwrap();

        Scene {
            params,
            timeline,
            track,
            clip,
        }
    }

    fn clip_opacity(scene: &Scene) -> f64 {
        scene.timeline.find_clip(scene.clip).unwrap().state().opacity()
    }

    #[test]
    fn test_clip_automation_is_clip_local() {
        let mut scene = scene();
        let mut engine = AutomationEngine::new();

        let stats = engine.tick(&mut scene.timeline, 150).unwrap();
        assert!((clip_opacity(&scene) - 50.0 / 99.0).abs() < 1e-9);
        assert!((clip_opacity(&scene) - 0.5051).abs() < 1e-4);
        assert_eq!(stats.clips_evaluated, 1);
        assert_eq!(stats.owners_evaluated, 3);
        assert_eq!(stats.sequences_updated, 1);

        engine.tick(&mut scene.timeline, 100).unwrap();
        assert_eq!(clip_opacity(&scene), 0.0);
        engine.tick(&mut scene.timeline, 199).unwrap();
        assert_eq!(clip_opacity(&scene), 1.0);
        assert_eq!(engine.tick_count(), 3);
        assert_eq!(engine.last_frame(), Some(199));
    }

    #[test]
    fn test_clip_outside_frame_is_untouched() {
        let mut scene = scene();
        let mut engine = AutomationEngine::new();
        engine.tick(&mut scene.timeline, 150).unwrap();
        let before = clip_opacity(&scene);

        {
            let track = scene.timeline.track_mut(scene.track).unwrap();
            let opacity = track.automation_mut().sequence_mut(&scene.params.track_opacity).unwrap();
            opacity.add_key_frame(0, AutomationValue::Double(0.2)).unwrap();
            opacity.add_key_frame(300, AutomationValue::Double(0.8)).unwrap();
        }

        let stats = engine.tick(&mut scene.timeline, 250).unwrap();
        assert_eq!(stats.clips_evaluated, 0);
        assert_eq!(stats.sequences_updated, 1);
        assert_eq!(clip_opacity(&scene), before);

        let track_opacity = scene.timeline.track(scene.track).unwrap().state().opacity();
        assert!((track_opacity - 0.7).abs() < 1e-9);
    }

    fn ignore_tempo(_: &mut (), _: &AutomationValue) {}

    #[test]
    fn test_timeline_automation_uses_global_frames() {
        let mut scene = scene();
        let registry = ParameterRegistry::new();
        let tempo = registry.register_double("Timeline", "Tempo", 0.0, 0.0, 1000.0).unwrap();
        {
            let automation = scene.timeline.automation_mut();
            automation.assign_key(&tempo, ignore_tempo).unwrap();
            let sequence = automation.sequence_mut(&tempo).unwrap();
            sequence.add_key_frame(0, AutomationValue::Double(0.0)).unwrap();
            sequence.add_key_frame(290, AutomationValue::Double(290.0)).unwrap();
        }
        let writes = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&writes);
        scene.timeline.automation_mut().on_parameter_changed(move |change, _| {
            log.borrow_mut().push((change.frame, change.value));
        });

        let mut engine = AutomationEngine::new();
        let stats = engine.tick(&mut scene.timeline, 250).unwrap();
        assert_eq!(stats.clips_evaluated, 0);
        assert_eq!(stats.sequences_updated, 1);
        assert_eq!(*writes.borrow(), vec![(250, AutomationValue::Double(250.0))]);

        engine.tick(&mut scene.timeline, 150).unwrap();
        assert_eq!(writes.borrow()[1], (150, AutomationValue::Double(150.0)));
    }

    #[test]
    fn test_evaluate_clip_out_of_range() {
        let mut scene = scene();
        let track = scene.timeline.track_mut(scene.track).unwrap();
        let clip = track.clip_mut(scene.clip).unwrap();

        assert!(matches!(
            AutomationEngine::evaluate_clip(clip, 99),
            Err(EngineError::FrameOutOfRange { frame: 99, begin: 100, duration: 100, .. })
        ));
        assert!(matches!(
            AutomationEngine::evaluate_clip(clip, 200),
            Err(EngineError::FrameOutOfRange { .. })
        ));
        assert!(matches!(
            AutomationEngine::evaluate_clip(clip, i64::MIN),
            Err(EngineError::FrameOutOfRange { frame: i64::MIN, .. })
        ));
        assert!(matches!(
            AutomationEngine::evaluate_clip(clip, i64::MAX),
            Err(EngineError::FrameOutOfRange { .. })
        ));
        assert!(AutomationEngine::evaluate_clip(clip, 199).is_ok());
    }

    #[test]
    fn test_disabled_track_is_skipped() {
        let mut scene = scene();
        scene.timeline.track_mut(scene.track).unwrap().set_automation_enabled(false);

        let stats = AutomationEngine::new().tick(&mut scene.timeline, 150).unwrap();
        assert_eq!(stats.owners_evaluated, 1);
        assert_eq!(stats.clips_evaluated, 0);
        assert_eq!(clip_opacity(&scene), 1.0);
    }

    #[test]
    fn test_effects_follow_clip_frame() {
        let mut scene = scene();
        let params = scene.params.clone();
        let clip = scene
            .timeline
            .track_mut(scene.track)
            .unwrap()
            .clip_mut(scene.clip)
            .unwrap();
        let mut effect = Effect::motion(&params).unwrap();
        {
            let rotation = effect.automation_mut().sequence_mut(&params.motion_rotation).unwrap();
            rotation.add_key_frame(0, AutomationValue::Double(0.0)).unwrap();
            rotation.add_key_frame(10, AutomationValue::Double(90.0)).unwrap();
        }
        let effect_id = clip.add_effect(effect);

        let mut engine = AutomationEngine::new();
        scene.timeline.set_play_head(105).unwrap();
        let stats = engine.tick_current(&mut scene.timeline).unwrap();
        assert_eq!(stats.owners_evaluated, 4);

        let clip = scene.timeline.find_clip(scene.clip).unwrap();
        let effect = clip.effects().iter().find(|e| e.id() == effect_id).unwrap();
        assert!((effect.state().rotation() - 45.0).abs() < 1e-9);
    }
}
