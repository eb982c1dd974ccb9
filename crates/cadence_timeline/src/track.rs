// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track definitions for the timeline.

use crate::clip::{Clip, ClipId, ClipKind, ClipRecord};
use crate::error::EngineError;
use crate::parameters::TimelineParameters;
use crate::span::FrameSpan;
use cadence_automation::{
    refresh_backing_storage, Automatable, AutomationData, AutomationError, AutomationValue, ParameterRegistry,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    /// Holds video clips
    Video,
    /// Holds audio clips
    Audio,
}

impl TrackKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
        }
    }

    /// The clip kind this track accepts
    pub fn clip_kind(&self) -> ClipKind {
        match self {
            Self::Video => ClipKind::Video,
            Self::Audio => ClipKind::Audio,
        }
    }
}

/// Values automation writes into a track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    opacity: f64,
    visible: bool,
    volume: f32,
    muted: bool,
    revision: u64,
}

impl Default for TrackState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            visible: true,
            volume: 1.0,
            muted: false,
            revision: 0,
        }
    }
}

impl TrackState {
    /// Opacity in `[0, 1]`
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Whether the track is rendered
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Volume in `[0, 1]`
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Whether the track is silenced
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Bumped every time a setter changes a value
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Set opacity, clamped. Returns whether it changed.
    pub fn set_opacity(&mut self, opacity: f64) -> bool {
        let opacity = opacity.clamp(0.0, 1.0);
        let changed = opacity != self.opacity;
        self.opacity = opacity;
        self.bump(changed)
    }

    /// Show or hide. Returns whether it changed.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        let changed = visible != self.visible;
        self.visible = visible;
        self.bump(changed)
    }

    /// Set volume, clamped. Returns whether it changed.
    pub fn set_volume(&mut self, volume: f32) -> bool {
        let volume = volume.clamp(0.0, 1.0);
        let changed = volume != self.volume;
        self.volume = volume;
        self.bump(changed)
    }

    /// Mute or unmute. Returns whether it changed.
    pub fn set_muted(&mut self, muted: bool) -> bool {
        let changed = muted != self.muted;
        self.muted = muted;
        self.bump(changed)
    }

    fn bump(&mut self, changed: bool) -> bool {
        if changed {
            self.revision += 1;
        }
        changed
    }
}

fn update_opacity(state: &mut TrackState, value: &AutomationValue) {
    if let Some(v) = value.as_double() {
        state.set_opacity(v);
    }
}

fn update_visible(state: &mut TrackState, value: &AutomationValue) {
    if let Some(v) = value.as_bool() {
        state.set_visible(v);
    }
}

fn update_volume(state: &mut TrackState, value: &AutomationValue) {
    if let Some(v) = value.as_float() {
        state.set_volume(v);
    }
}

fn update_muted(state: &mut TrackState, value: &AutomationValue) {
    if let Some(v) = value.as_bool() {
        state.set_muted(v);
    }
}

/// A track holding clips ordered by their first frame
#[derive(Debug)]
pub struct Track {
    id: TrackId,
    /// Display name
    pub name: String,
    kind: TrackKind,
    clips: Vec<Clip>,
    automation_enabled: bool,
    automation: AutomationData<TrackState>,
    state: TrackState,
}

impl Track {
    fn with_kind(name: impl Into<String>, kind: TrackKind, params: &TimelineParameters) -> Result<Self, AutomationError> {
        let mut automation = AutomationData::new();
        match kind {
            TrackKind::Video => {
                automation.assign_key(&params.track_opacity, update_opacity)?;
                automation.assign_key(&params.track_visible, update_visible)?;
            }
            TrackKind::Audio => {
                automation.assign_key(&params.track_volume, update_volume)?;
                automation.assign_key(&params.track_muted, update_muted)?;
            }
        }

        let mut track = Self {
            id: TrackId::new(),
            name: name.into(),
            kind,
            clips: Vec::new(),
            automation_enabled: true,
            automation,
            state: TrackState::default(),
        };
        refresh_backing_storage(&mut track)?;
        Ok(track)
    }

    /// Create a video track
    pub fn video(name: impl Into<String>, params: &TimelineParameters) -> Result<Self, AutomationError> {
        Self::with_kind(name, TrackKind::Video, params)
    }

    /// Create an audio track
    pub fn audio(name: impl Into<String>, params: &TimelineParameters) -> Result<Self, AutomationError> {
        Self::with_kind(name, TrackKind::Audio, params)
    }

    /// Track ID
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Track type
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Whether the engine evaluates this track and its clips
    pub fn can_update_automation(&self) -> bool {
        self.automation_enabled
    }

    /// Enable or disable automation for this track and its clips
    pub fn set_automation_enabled(&mut self, enabled: bool) {
        self.automation_enabled = enabled;
    }

    /// Add a clip, keeping clips ordered by begin frame
    pub fn add_clip(&mut self, clip: Clip) -> Result<ClipId, EngineError> {
        if clip.kind() != self.kind.clip_kind() {
            return Err(EngineError::KindMismatch {
                clip: clip.kind().name(),
                track: self.kind.name(),
            });
        }
        let id = clip.id();
        self.insert_ordered(clip);
        Ok(id)
    }

    fn insert_ordered(&mut self, clip: Clip) {
        let begin = clip.span().begin();
        let index = self.clips.partition_point(|c| c.span().begin() <= begin);
        self.clips.insert(index, clip);
    }

    /// Remove a clip
    pub fn remove_clip(&mut self, clip_id: ClipId) -> Option<Clip> {
        let index = self.clips.iter().position(|c| c.id() == clip_id)?;
        Some(self.clips.remove(index))
    }

    /// Move or resize a clip
    pub fn set_clip_span(&mut self, clip_id: ClipId, span: FrameSpan) -> Result<(), EngineError> {
        let mut clip = self.remove_clip(clip_id).ok_or(EngineError::UnknownClip(clip_id))?;
        clip.set_span(span);
        self.insert_ordered(clip);
        Ok(())
    }

    /// Get a clip
    pub fn clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id() == clip_id)
    }

    /// Get a mutable clip
    pub fn clip_mut(&mut self, clip_id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id() == clip_id)
    }

    /// All clips, ordered by begin frame
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub(crate) fn clips_mut(&mut self) -> &mut [Clip] {
        &mut self.clips
    }

    /// Clips covering `frame`
    pub fn clips_at(&self, frame: i64) -> impl Iterator<Item = &Clip> {
        self.clips.iter().filter(move |c| c.span().intersects(frame))
    }

    /// One past the last frame of the last clip
    pub fn end_frame(&self) -> i64 {
        self.clips.iter().map(|c| c.span().end()).max().unwrap_or(0)
    }

    /// Current automated values
    pub fn state(&self) -> &TrackState {
        &self.state
    }

    /// Mutable state, for edits outside automation
    pub fn state_mut(&mut self) -> &mut TrackState {
        &mut self.state
    }

    /// Automation data
    pub fn automation(&self) -> &AutomationData<TrackState> {
        &self.automation
    }

    /// Mutable automation data
    pub fn automation_mut(&mut self) -> &mut AutomationData<TrackState> {
        &mut self.automation
    }

    pub(crate) fn to_record(&self) -> Result<TrackRecord, AutomationError> {
        Ok(TrackRecord {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            automation_enabled: self.automation_enabled,
            automation: self.automation.serialize()?,
            clips: self.clips.iter().map(Clip::to_record).collect::<Result<_, _>>()?,
        })
    }

    pub(crate) fn from_record(
        record: &TrackRecord,
        registry: &ParameterRegistry,
        params: &TimelineParameters,
    ) -> Result<Self, EngineError> {
        let mut track = Self::with_kind(record.name.clone(), record.kind, params)?;
        track.id = record.id;
        track.automation_enabled = record.automation_enabled;
        track.automation.deserialize(&record.automation, registry)?;
        for clip in &record.clips {
            track.add_clip(Clip::from_record(clip, registry, params)?)?;
        }
        refresh_backing_storage(&mut track)?;
        Ok(track)
    }
}

impl Automatable for Track {
    type State = TrackState;

    fn automation_data(&self) -> &AutomationData<TrackState> {
        &self.automation
    }

    fn automation_parts(&mut self) -> (&mut AutomationData<TrackState>, &mut TrackState) {
        (&mut self.automation, &mut self.state)
    }
}

/// Persisted form of a track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TrackRecord {
    pub(crate) id: TrackId,
    pub(crate) name: String,
    pub(crate) kind: TrackKind,
    #[serde(default = "default_true")]
    pub(crate) automation_enabled: bool,
    pub(crate) automation: serde_json::Value,
    #[serde(default)]
    pub(crate) clips: Vec<ClipRecord>,
}

fn default_true() -> bool {
    true
}
