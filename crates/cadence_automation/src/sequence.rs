// SPDX-License-Identifier: MIT OR Apache-2.0
//! Automation sequence: the keyframes driving one parameter on one owner.

use crate::error::AutomationError;
use crate::keyframe::{InterpolationMode, Keyframe};
use crate::registry::Parameter;
use crate::value::{AutomationDataType, AutomationValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Writes an automated value into an owner's backing state.
///
/// Bound once per owner type when the owner assigns its parameters; it should
/// go through the state's setter so clamping and validation always apply.
pub type UpdateFn<S> = fn(&mut S, &AutomationValue);

/// Persisted form of a sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SequenceRecord {
    #[serde(rename = "KeyId")]
    pub(crate) key_id: String,
    pub(crate) data_type: AutomationDataType,
    pub(crate) override_enabled: bool,
    pub(crate) override_value: AutomationValue,
    pub(crate) key_frames: Vec<Keyframe>,
}

/// Ordered keyframes plus an override value for one parameter.
///
/// Keyframe frames are unique and kept in ascending order; every insertion
/// goes through a binary search.
pub struct AutomationSequence<S> {
    parameter: Parameter,
    key_frames: Vec<Keyframe>,
    override_enabled: bool,
    override_value: AutomationValue,
    update: UpdateFn<S>,
}

impl<S> AutomationSequence<S> {
    pub(crate) fn new(parameter: Parameter, update: UpdateFn<S>) -> Self {
        let override_value = parameter.default_value();
        Self {
            parameter,
            key_frames: Vec::new(),
            override_enabled: false,
            override_value,
            update,
        }
    }

    /// The parameter this sequence drives
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    /// The parameter's data type
    pub fn data_type(&self) -> AutomationDataType {
        self.parameter.data_type()
    }

    /// All keyframes, ordered by frame
    pub fn key_frames(&self) -> &[Keyframe] {
        &self.key_frames
    }

    /// Whether any keyframes exist
    pub fn has_key_frames(&self) -> bool {
        !self.key_frames.is_empty()
    }

    /// Keyframe count
    pub fn key_frame_count(&self) -> usize {
        self.key_frames.len()
    }

    /// Whether override mode is on
    pub fn is_override_enabled(&self) -> bool {
        self.override_enabled
    }

    /// Turn override mode on or off. While on, keyframes are ignored.
    pub fn set_override_enabled(&mut self, enabled: bool) {
        self.override_enabled = enabled;
    }

    /// The static override value (starts as the parameter default)
    pub fn override_value(&self) -> AutomationValue {
        self.override_value
    }

    /// Set the static override value
    pub fn set_override_value(&mut self, value: AutomationValue) -> Result<(), AutomationError> {
        self.check_type(&value)?;
        self.override_value = self.parameter.clamp(value);
        Ok(())
    }

    /// Whether the engine should evaluate this sequence
    pub fn is_automation_in_use(&self) -> bool {
        self.override_enabled || !self.key_frames.is_empty()
    }

    /// Add a linear keyframe. Returns its index.
    ///
    /// A keyframe already at `frame` is replaced.
    pub fn add_key_frame(&mut self, frame: i64, value: AutomationValue) -> Result<usize, AutomationError> {
        self.add_key_frame_with(frame, value, InterpolationMode::Linear)
    }

    /// Add a keyframe with an explicit interpolation mode. Returns its index.
    pub fn add_key_frame_with(
        &mut self,
        frame: i64,
        value: AutomationValue,
        mode: InterpolationMode,
    ) -> Result<usize, AutomationError> {
        if frame < 0 {
            return Err(AutomationError::InvalidFrame(frame));
        }
        self.check_type(&value)?;
        let value = self.parameter.clamp(value);

        match self.key_frames.binary_search_by_key(&frame, |k| k.frame()) {
            Ok(index) => {
                let existing = &mut self.key_frames[index];
                existing.set_value(value);
                existing.set_interpolation(mode);
                Ok(index)
            }
            Err(index) => {
                self.key_frames
                    .insert(index, Keyframe::new(frame, value).with_interpolation(mode));
                Ok(index)
            }
        }
    }

    /// Add a keyframe holding the sequence's current value at `frame`
    pub fn add_key_frame_at_current(&mut self, frame: i64) -> Result<usize, AutomationError> {
        let value = self.value_ignoring_override(frame).unwrap_or(self.override_value);
        self.add_key_frame(frame, value)
    }

    /// Remove the keyframe at `frame`
    pub fn remove_key_frame(&mut self, frame: i64) -> Option<Keyframe> {
        let index = self.index_of(frame)?;
        Some(self.key_frames.remove(index))
    }

    /// Remove the keyframe at `index`
    pub fn remove_key_frame_at(&mut self, index: usize) -> Option<Keyframe> {
        if index < self.key_frames.len() {
            Some(self.key_frames.remove(index))
        } else {
            None
        }
    }

    /// Remove all keyframes
    pub fn clear(&mut self) {
        self.key_frames.clear();
    }

    /// Index of the keyframe exactly at `frame`
    pub fn index_of(&self, frame: i64) -> Option<usize> {
        self.key_frames.binary_search_by_key(&frame, |k| k.frame()).ok()
    }

    /// Keyframe exactly at `frame`
    pub fn key_frame_at(&self, frame: i64) -> Option<&Keyframe> {
        self.index_of(frame).map(|index| &self.key_frames[index])
    }

    /// Effective value at `frame`.
    ///
    /// The override value when override is on, `None` when there are no
    /// keyframes (the owner keeps its own value), otherwise the keyframe
    /// value interpolated at `frame`.
    pub fn get_value_at(&self, frame: i64) -> Option<AutomationValue> {
        if self.override_enabled {
            return Some(self.override_value);
        }
        self.value_ignoring_override(frame)
    }

    fn value_ignoring_override(&self, frame: i64) -> Option<AutomationValue> {
        let frames = &self.key_frames;
        let first = frames.first()?;

        match frames.binary_search_by_key(&frame, |k| k.frame()) {
            Ok(index) => Some(frames[index].value()),
            Err(0) => Some(first.value()),
            Err(index) if index == frames.len() => Some(frames[index - 1].value()),
            Err(index) => Some(frames[index - 1].interpolate(&frames[index], frame)),
        }
    }

    /// Compute the value at `frame` and write it into `state`.
    ///
    /// Returns the written value, or `None` if the sequence is not driven.
    pub fn do_update_value(&self, state: &mut S, frame: i64) -> Option<AutomationValue> {
        let value = self.get_value_at(frame)?;
        (self.update)(state, &value);
        Some(value)
    }

    /// Write the static override value into `state`, whatever the keyframes say
    pub fn apply_static_value(&self, state: &mut S) -> AutomationValue {
        (self.update)(state, &self.override_value);
        self.override_value
    }

    /// Persist this sequence into a structured tree
    pub fn write_tree(&self) -> Result<serde_json::Value, AutomationError> {
        Ok(serde_json::to_value(self.to_record())?)
    }

    /// Load this sequence from a structured tree written by [`Self::write_tree`]
    pub fn read_tree(&mut self, tree: &serde_json::Value) -> Result<(), AutomationError> {
        let record: SequenceRecord = serde_json::from_value(tree.clone())?;
        if record.key_id != self.parameter.full_id() {
            return Err(AutomationError::StructureMismatch(format!(
                "expected {}, found {}",
                self.parameter, record.key_id
            )));
        }
        self.validate_record(&record)?;
        self.apply_record(record);
        Ok(())
    }

    pub(crate) fn to_record(&self) -> SequenceRecord {
        SequenceRecord {
            key_id: self.parameter.full_id().to_string(),
            data_type: self.data_type(),
            override_enabled: self.override_enabled,
            override_value: self.override_value,
            key_frames: self.key_frames.clone(),
        }
    }

    pub(crate) fn validate_record(&self, record: &SequenceRecord) -> Result<(), AutomationError> {
        if record.data_type != self.data_type() {
            return Err(self.mismatch(record.data_type));
        }
        self.check_type(&record.override_value)?;
        for key_frame in &record.key_frames {
            if key_frame.frame() < 0 {
                return Err(AutomationError::InvalidFrame(key_frame.frame()));
            }
            self.check_type(&key_frame.value())?;
        }
        Ok(())
    }

    /// Apply a validated record. Frames are re-sorted and values clamped; for
    /// duplicate frames the last one wins.
    pub(crate) fn apply_record(&mut self, record: SequenceRecord) {
        let mut key_frames = record.key_frames;
        key_frames.sort_by_key(|k| k.frame());
        let mut deduped: Vec<Keyframe> = Vec::with_capacity(key_frames.len());
        for mut key_frame in key_frames {
            key_frame.set_value(self.parameter.clamp(key_frame.value()));
            match deduped.last_mut() {
                Some(last) if last.frame() == key_frame.frame() => *last = key_frame,
                _ => deduped.push(key_frame),
            }
        }

        self.key_frames = deduped;
        self.override_enabled = record.override_enabled;
        self.override_value = self.parameter.clamp(record.override_value);
    }

    pub(crate) fn copy_from(&mut self, source: &AutomationSequence<S>) {
        self.key_frames = source.key_frames.clone();
        self.override_enabled = source.override_enabled;
        self.override_value = source.override_value;
    }

    fn check_type(&self, value: &AutomationValue) -> Result<(), AutomationError> {
        if value.data_type() == self.data_type() {
            Ok(())
        } else {
            Err(self.mismatch(value.data_type()))
        }
    }

    fn mismatch(&self, actual: AutomationDataType) -> AutomationError {
        AutomationError::TypeMismatch {
            parameter: self.parameter.full_id().to_string(),
            expected: self.data_type(),
            actual,
        }
    }
}

impl<S> fmt::Debug for AutomationSequence<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationSequence")
            .field("parameter", &self.parameter)
            .field("key_frames", &self.key_frames)
            .field("override_enabled", &self.override_enabled)
            .field("override_value", &self.override_value)
            .finish()
    }
}
