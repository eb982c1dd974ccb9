// SPDX-License-Identifier: MIT OR Apache-2.0
//! Demo timeline and the headless playback loop.

use cadence_automation::{AutomationError, AutomationValue, InterpolationMode, ParameterRegistry};
use cadence_timeline::{
    Clip, EngineError, EngineSettings, Effect, FrameSpan, PlaybackController, Timeline, TimelineParameters, Track,
};
use std::path::Path;

/// Error raised by the preview driver
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// Engine or persistence failure
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Automation setup failure
    #[error(transparent)]
    Automation(#[from] AutomationError),

    /// Settings cannot drive a preview
    #[error("Invalid preview settings: {0}")]
    Settings(String),
}

/// Build a small timeline: a fading video clip with motion, and an audio bed.
pub fn build_demo(params: &TimelineParameters) -> Result<Timeline, PreviewError> {
    let mut timeline = Timeline::new("Demo");

    let mut video = Track::video("Video 1", params)?;
    let mut clip = Clip::video("Title", FrameSpan::new(30, 120)?, params)?;
    {
        let opacity = clip.automation_mut().sequence_mut(&params.clip_opacity)?;
        opacity.add_key_frame(0, AutomationValue::Double(0.0))?;
        opacity.add_key_frame(20, AutomationValue::Double(1.0))?;
        opacity.add_key_frame(100, AutomationValue::Double(1.0))?;
        opacity.add_key_frame(119, AutomationValue::Double(0.0))?;
    }
    clip.automation_mut().on_parameter_changed(|change, _| {
        tracing::trace!(parameter = %change.parameter, frame = change.frame, value = %change.value, "Clip changed");
    });

    let mut motion = Effect::motion(params)?;
    {
        let rotation = motion.automation_mut().sequence_mut(&params.motion_rotation)?;
        rotation.add_key_frame(0, AutomationValue::Double(-15.0))?;
        rotation.add_key_frame_with(60, AutomationValue::Double(15.0), InterpolationMode::Curve { bend: 2.0 })?;
        rotation.add_key_frame(119, AutomationValue::Double(0.0))?;
    }
    clip.add_effect(motion);
    video.add_clip(clip)?;
    timeline.add_track(video);

    let mut audio = Track::audio("Audio 1", params)?;
    {
        let volume = audio.automation_mut().sequence_mut(&params.track_volume)?;
        volume.add_key_frame(0, AutomationValue::Float(0.2))?;
        volume.add_key_frame(150, AutomationValue::Float(0.8))?;
    }
    audio
        .automation_mut()
        .sequence_mut(&params.track_muted)?
        .add_key_frame(200, AutomationValue::Bool(true))?;
    audio.add_clip(Clip::audio("Music", FrameSpan::new(0, 240)?, params)?)?;
    timeline.add_track(audio);

    Ok(timeline)
}

fn log_state(timeline: &Timeline) {
    for track in timeline.tracks() {
        let state = track.state();
        tracing::info!(
            frame = timeline.play_head(),
            track = %track.name,
            opacity = state.opacity(),
            visible = state.is_visible(),
            volume = state.volume(),
            muted = state.is_muted(),
            "Track state"
        );
        for clip in track.clips_at(timeline.play_head()) {
            tracing::info!(clip = %clip.name, opacity = clip.state().opacity(), volume = clip.state().volume(), "Clip state");
        }
    }
}

/// Play a timeline for the configured number of frames
pub fn run(settings: &EngineSettings, project: Option<&Path>) -> Result<(), PreviewError> {
    if settings.frame_rate <= 0.0 {
        return Err(PreviewError::Settings(format!("frame rate {} must be positive", settings.frame_rate)));
    }

    let registry = ParameterRegistry::new();
    let params = TimelineParameters::register(&registry).map_err(EngineError::from)?;

    let mut timeline = match project {
        Some(path) => Timeline::load_project(path, &registry, &params)?,
        None => build_demo(&params)?,
    };
    timeline.frame_rate = settings.frame_rate;

    let mut playback = PlaybackController::new();
    playback.looping = settings.loop_playback;
    playback.refresh(&mut timeline)?;
    playback.play();

    let report_every = settings.frame_rate.round().max(1.0) as i64;
    for _ in 0..settings.preview_frames {
        if playback.advance(&mut timeline)?.is_none() {
            break;
        }
        if timeline.play_head() % report_every == 0 {
            log_state(&timeline);
        }
    }
    playback.stop(&mut timeline)?;

    tracing::info!(ticks = playback.engine().tick_count(), "Preview finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_runs() {
        let settings = EngineSettings {
            preview_frames: 60,
            ..Default::default()
        };
        assert!(run(&settings, None).is_ok());
    }

    #[test]
    fn test_demo_fades_in() {
        let registry = ParameterRegistry::new();
        let params = TimelineParameters::register(&registry).unwrap();
        let mut timeline = build_demo(&params).unwrap();

        let mut playback = PlaybackController::new();
        playback.seek(&mut timeline, 40).unwrap();

        let track = timeline.tracks().next().unwrap();
        let clip = &track.clips()[0];
        assert!((clip.state().opacity() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_frame_rate() {
        let settings = EngineSettings {
            frame_rate: 0.0,
            ..Default::default()
        };
        assert!(matches!(run(&settings, None), Err(PreviewError::Settings(_))));
    }
}
