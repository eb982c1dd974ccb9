// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip definitions.
//!
//! A clip occupies a [`FrameSpan`] of its track. Its own automation and that
//! of its effects are keyed in clip-local frames, so moving a clip moves its
//! automation with it.

use crate::effect::{Effect, EffectId, EffectRecord};
use crate::parameters::TimelineParameters;
use crate::span::FrameSpan;
use cadence_automation::{
    refresh_backing_storage, Automatable, AutomationData, AutomationError, AutomationValue, ParameterRegistry,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipKind {
    /// Visual media
    Video,
    /// Sound
    Audio,
}

impl ClipKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
        }
    }
}

/// Values automation writes into a clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipState {
    opacity: f64,
    volume: f32,
    revision: u64,
}

impl Default for ClipState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            volume: 1.0,
            revision: 0,
        }
    }
}

impl ClipState {
    /// Opacity in `[0, 1]`
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Volume in `[0, 1]`
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Bumped every time a setter changes a value
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Set opacity, clamped. Returns whether it changed.
    pub fn set_opacity(&mut self, opacity: f64) -> bool {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity == self.opacity {
            return false;
        }
        self.opacity = opacity;
        self.revision += 1;
        true
    }

    /// Set volume, clamped. Returns whether it changed.
    pub fn set_volume(&mut self, volume: f32) -> bool {
        let volume = volume.clamp(0.0, 1.0);
        if volume == self.volume {
            return false;
        }
        self.volume = volume;
        self.revision += 1;
        true
    }
}

fn update_opacity(state: &mut ClipState, value: &AutomationValue) {
    if let Some(v) = value.as_double() {
        state.set_opacity(v);
    }
}

fn update_volume(state: &mut ClipState, value: &AutomationValue) {
    if let Some(v) = value.as_float() {
        state.set_volume(v);
    }
}

/// A clip on a track
#[derive(Debug)]
pub struct Clip {
    id: ClipId,
    /// Display name
    pub name: String,
    kind: ClipKind,
    span: FrameSpan,
    effects: Vec<Effect>,
    automation: AutomationData<ClipState>,
    state: ClipState,
}

impl Clip {
    fn with_kind(
        name: impl Into<String>,
        kind: ClipKind,
        span: FrameSpan,
        params: &TimelineParameters,
    ) -> Result<Self, AutomationError> {
        let mut automation = AutomationData::new();
        match kind {
            ClipKind::Video => automation.assign_key(&params.clip_opacity, update_opacity)?,
            ClipKind::Audio => automation.assign_key(&params.clip_volume, update_volume)?,
        }

        let mut clip = Self {
            id: ClipId::new(),
            name: name.into(),
            kind,
            span,
            effects: Vec::new(),
            automation,
            state: ClipState::default(),
        };
        refresh_backing_storage(&mut clip)?;
        Ok(clip)
    }

    /// Create a video clip
    pub fn video(name: impl Into<String>, span: FrameSpan, params: &TimelineParameters) -> Result<Self, AutomationError> {
        Self::with_kind(name, ClipKind::Video, span, params)
    }

    /// Create an audio clip
    pub fn audio(name: impl Into<String>, span: FrameSpan, params: &TimelineParameters) -> Result<Self, AutomationError> {
        Self::with_kind(name, ClipKind::Audio, span, params)
    }

    /// Clip ID
    pub fn id(&self) -> ClipId {
        self.id
    }

    /// Clip type
    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    /// Where the clip sits on its track
    pub fn span(&self) -> FrameSpan {
        self.span
    }

    /// Move or resize the clip. Automation stays clip-local.
    pub(crate) fn set_span(&mut self, span: FrameSpan) {
        self.span = span;
    }

    /// Effects in evaluation order
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Mutable effects
    pub fn effects_mut(&mut self) -> &mut [Effect] {
        &mut self.effects
    }

    /// Append an effect
    pub fn add_effect(&mut self, effect: Effect) -> EffectId {
        let id = effect.id();
        self.effects.push(effect);
        id
    }

    /// Remove an effect
    pub fn remove_effect(&mut self, effect_id: EffectId) -> Option<Effect> {
        let index = self.effects.iter().position(|e| e.id() == effect_id)?;
        Some(self.effects.remove(index))
    }

    /// Get a mutable effect
    pub fn effect_mut(&mut self, effect_id: EffectId) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|e| e.id() == effect_id)
    }

    /// Current automated values
    pub fn state(&self) -> &ClipState {
        &self.state
    }

    /// Mutable state, for edits outside automation
    pub fn state_mut(&mut self) -> &mut ClipState {
        &mut self.state
    }

    /// Automation data
    pub fn automation(&self) -> &AutomationData<ClipState> {
        &self.automation
    }

    /// Mutable automation data
    pub fn automation_mut(&mut self) -> &mut AutomationData<ClipState> {
        &mut self.automation
    }

    /// Copy of this clip and its effects under new ids, at the same span.
    ///
    /// Automation is copied and every owner's state is refreshed from its
    /// static values.
    pub fn duplicate(&self, params: &TimelineParameters) -> Result<Self, AutomationError> {
        let mut copy = Self::with_kind(self.name.clone(), self.kind, self.span, params)?;
        self.automation.clone_into(&mut copy.automation)?;
        for effect in &self.effects {
            copy.effects.push(effect.duplicate(params)?);
        }
        refresh_backing_storage(&mut copy)?;
        Ok(copy)
    }

    pub(crate) fn to_record(&self) -> Result<ClipRecord, AutomationError> {
        Ok(ClipRecord {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            span: self.span,
            automation: self.automation.serialize()?,
            effects: self.effects.iter().map(Effect::to_record).collect::<Result<_, _>>()?,
        })
    }

    pub(crate) fn from_record(
        record: &ClipRecord,
        registry: &ParameterRegistry,
        params: &TimelineParameters,
    ) -> Result<Self, AutomationError> {
        let mut clip = Self::with_kind(record.name.clone(), record.kind, record.span, params)?;
        clip.id = record.id;
        clip.automation.deserialize(&record.automation, registry)?;
        for effect in &record.effects {
            clip.effects.push(Effect::from_record(effect, registry, params)?);
        }
        refresh_backing_storage(&mut clip)?;
        Ok(clip)
    }
}

impl Automatable for Clip {
    type State = ClipState;

    fn automation_data(&self) -> &AutomationData<ClipState> {
        &self.automation
    }

    fn automation_parts(&mut self) -> (&mut AutomationData<ClipState>, &mut ClipState) {
        (&mut self.automation, &mut self.state)
    }
}

/// Persisted form of a clip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ClipRecord {
    pub(crate) id: ClipId,
    pub(crate) name: String,
    pub(crate) kind: ClipKind,
    pub(crate) span: FrameSpan,
    pub(crate) automation: serde_json::Value,
    #[serde(default)]
    pub(crate) effects: Vec<EffectRecord>,
}
