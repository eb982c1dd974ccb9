// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip effects.

use crate::parameters::{TimelineParameters, MAX_POSITION, MAX_ROTATION, MAX_SCALE};
use cadence_automation::{
    refresh_backing_storage, Automatable, AutomationData, AutomationError, AutomationValue, ParameterRegistry,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(pub Uuid);

impl EffectId {
    /// Create a new random effect ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Position, scale and rotation
    Motion,
}

impl EffectKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Motion => "Motion",
        }
    }
}

/// Transform written by a motion effect
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    position: [f32; 2],
    scale: [f32; 2],
    rotation: f64,
    revision: u64,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            scale: [1.0, 1.0],
            rotation: 0.0,
            revision: 0,
        }
    }
}

fn clamp2(v: [f32; 2], limit: f32) -> [f32; 2] {
    [v[0].clamp(-limit, limit), v[1].clamp(-limit, limit)]
}

impl MotionState {
    /// Offset in pixels
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    /// Scale factors
    pub fn scale(&self) -> [f32; 2] {
        self.scale
    }

    /// Rotation in degrees
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Bumped every time a setter changes a value
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Set position. Returns whether it changed.
    pub fn set_position(&mut self, position: [f32; 2]) -> bool {
        let position = clamp2(position, MAX_POSITION);
        self.commit(position != self.position, |s| s.position = position)
    }

    /// Set scale. Returns whether it changed.
    pub fn set_scale(&mut self, scale: [f32; 2]) -> bool {
        let scale = clamp2(scale, MAX_SCALE);
        self.commit(scale != self.scale, |s| s.scale = scale)
    }

    /// Set rotation. Returns whether it changed.
    pub fn set_rotation(&mut self, degrees: f64) -> bool {
        let degrees = degrees.clamp(-MAX_ROTATION, MAX_ROTATION);
        self.commit(degrees != self.rotation, |s| s.rotation = degrees)
    }

    fn commit(&mut self, changed: bool, apply: impl FnOnce(&mut Self)) -> bool {
        if changed {
            apply(self);
            self.revision += 1;
        }
        changed
    }
}

fn update_position(state: &mut MotionState, value: &AutomationValue) {
    if let Some(v) = value.as_vector2() {
        state.set_position(v);
    }
}

fn update_scale(state: &mut MotionState, value: &AutomationValue) {
    if let Some(v) = value.as_vector2() {
        state.set_scale(v);
    }
}

fn update_rotation(state: &mut MotionState, value: &AutomationValue) {
    if let Some(v) = value.as_double() {
        state.set_rotation(v);
    }
}

/// An effect attached to a clip, evaluated in the clip's frame space
#[derive(Debug)]
pub struct Effect {
    id: EffectId,
    kind: EffectKind,
    automation: AutomationData<MotionState>,
    state: MotionState,
}

impl Effect {
    /// Create a motion effect
    pub fn motion(params: &TimelineParameters) -> Result<Self, AutomationError> {
        let mut automation = AutomationData::new();
        automation.assign_key(&params.motion_position, update_position)?;
        automation.assign_key(&params.motion_scale, update_scale)?;
        automation.assign_key(&params.motion_rotation, update_rotation)?;

        let mut effect = Self {
            id: EffectId::new(),
            kind: EffectKind::Motion,
            automation,
            state: MotionState::default(),
        };
        refresh_backing_storage(&mut effect)?;
        Ok(effect)
    }

    /// Effect ID
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Effect type
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Current transform
    pub fn state(&self) -> &MotionState {
        &self.state
    }

    /// Mutable transform, for edits outside automation
    pub fn state_mut(&mut self) -> &mut MotionState {
        &mut self.state
    }

    /// Automation data
    pub fn automation(&self) -> &AutomationData<MotionState> {
        &self.automation
    }

    /// Mutable automation data
    pub fn automation_mut(&mut self) -> &mut AutomationData<MotionState> {
        &mut self.automation
    }

    /// Copy of this effect under a new id.
    ///
    /// Keyframes and override values are copied; the copy's transform is
    /// refreshed from its static values.
    pub fn duplicate(&self, params: &TimelineParameters) -> Result<Self, AutomationError> {
        let mut copy = match self.kind {
            EffectKind::Motion => Self::motion(params)?,
        };
        self.automation.clone_into(&mut copy.automation)?;
        refresh_backing_storage(&mut copy)?;
        Ok(copy)
    }

    pub(crate) fn to_record(&self) -> Result<EffectRecord, AutomationError> {
        Ok(EffectRecord {
            id: self.id,
            kind: self.kind,
            automation: self.automation.serialize()?,
        })
    }

    pub(crate) fn from_record(
        record: &EffectRecord,
        registry: &ParameterRegistry,
        params: &TimelineParameters,
    ) -> Result<Self, AutomationError> {
        let mut effect = match record.kind {
            EffectKind::Motion => Self::motion(params)?,
        };
        effect.id = record.id;
        effect.automation.deserialize(&record.automation, registry)?;
        refresh_backing_storage(&mut effect)?;
        Ok(effect)
    }
}

impl Automatable for Effect {
    type State = MotionState;

    fn automation_data(&self) -> &AutomationData<MotionState> {
        &self.automation
    }

    fn automation_parts(&mut self) -> (&mut AutomationData<MotionState>, &mut MotionState) {
        (&mut self.automation, &mut self.state)
    }
}

/// Persisted form of an effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EffectRecord {
    pub(crate) id: EffectId,
    pub(crate) kind: EffectKind,
    pub(crate) automation: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_automation::evaluate_owner;

    #[test]
    fn test_motion_defaults_and_setters() {
        let registry = ParameterRegistry::new();
        let params = TimelineParameters::register(&registry).unwrap();
        let mut effect = Effect::motion(&params).unwrap();

        assert_eq!(effect.state().scale(), [1.0, 1.0]);
        let revision = effect.state().revision();
        assert!(!effect.state_mut().set_scale([1.0, 1.0]));
        assert!(effect.state_mut().set_rotation(9000.0));
        assert_eq!(effect.state().rotation(), MAX_ROTATION);
        assert_eq!(effect.state().revision(), revision + 1);
    }

    #[test]
    fn test_motion_automation() {
        let registry = ParameterRegistry::new();
        let params = TimelineParameters::register(&registry).unwrap();
        let mut effect = Effect::motion(&params).unwrap();
        {
            let position = effect.automation_mut().sequence_mut(&params.motion_position).unwrap();
            position.add_key_frame(0, AutomationValue::Vector2([0.0, 0.0])).unwrap();
            position.add_key_frame(10, AutomationValue::Vector2([100.0, -50.0])).unwrap();
        }

        assert_eq!(evaluate_owner(&mut effect, 5).unwrap(), 1);
        let [x, y] = effect.state().position();
        assert!((x - 50.0).abs() < 1e-4);
        assert!((y + 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_duplicate_copies_automation() {
        let registry = ParameterRegistry::new();
        let params = TimelineParameters::register(&registry).unwrap();
        let mut effect = Effect::motion(&params).unwrap();
        {
            let rotation = effect.automation_mut().sequence_mut(&params.motion_rotation).unwrap();
            rotation.add_key_frame(0, AutomationValue::Double(10.0)).unwrap();
            rotation.set_override_value(AutomationValue::Double(30.0)).unwrap();
        }

        let copy = effect.duplicate(&params).unwrap();
        assert_ne!(copy.id(), effect.id());
        assert_eq!(
            copy.automation()[&params.motion_rotation].key_frames(),
            effect.automation()[&params.motion_rotation].key_frames()
        );
        assert_eq!(copy.state().rotation(), 30.0);
    }
}
