// SPDX-License-Identifier: MIT OR Apache-2.0
//! Automation data: every sequence owned by one automatable object.

use crate::error::AutomationError;
use crate::registry::{Parameter, ParameterRegistry};
use crate::sequence::{AutomationSequence, SequenceRecord, UpdateFn};
use crate::value::AutomationValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::ops::Index;

/// Evaluation state of an owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutomationState {
    /// Not being evaluated
    #[default]
    Idle,
    /// Automation is writing into the owner
    Evaluating,
}

/// Sets an owner to [`AutomationState::Evaluating`] for as long as it lives.
pub(crate) struct EvaluationGuard<'a> {
    state: &'a Cell<AutomationState>,
}

impl<'a> EvaluationGuard<'a> {
    pub(crate) fn enter(state: &'a Cell<AutomationState>) -> Result<Self, AutomationError> {
        if state.get() == AutomationState::Evaluating {
            return Err(AutomationError::ReentrantEvaluation);
        }
        state.set(AutomationState::Evaluating);
        Ok(Self { state })
    }
}

impl Drop for EvaluationGuard<'_> {
    fn drop(&mut self) {
        self.state.set(AutomationState::Idle);
    }
}

/// An automation write that just happened
#[derive(Debug, Clone)]
pub struct ParameterChange {
    /// The parameter that was written
    pub parameter: Parameter,
    /// Frame the value was computed for
    pub frame: i64,
    /// The value written into the owner's state
    pub value: AutomationValue,
}

/// View of an owner's sequences handed to change handlers.
///
/// Reads always succeed; writes are refused while the owner is evaluating.
pub struct SequenceAccess<'a, S> {
    sequences: &'a mut IndexMap<Parameter, AutomationSequence<S>>,
    state: AutomationState,
}

impl<S> SequenceAccess<'_, S> {
    /// Evaluation state of the owner
    pub fn state(&self) -> AutomationState {
        self.state
    }

    /// Read a sequence
    pub fn sequence(&self, parameter: &Parameter) -> Option<&AutomationSequence<S>> {
        self.sequences.get(parameter)
    }

    /// Mutable access to a sequence
    pub fn sequence_mut(&mut self, parameter: &Parameter) -> Result<&mut AutomationSequence<S>, AutomationError> {
        guarded_mut(self.sequences, self.state, parameter)
    }
}

/// Callback run after every automation write
pub type ChangeHandler<S> = Box<dyn FnMut(&ParameterChange, &mut SequenceAccess<'_, S>)>;

fn guarded_mut<'a, S>(
    sequences: &'a mut IndexMap<Parameter, AutomationSequence<S>>,
    state: AutomationState,
    parameter: &Parameter,
) -> Result<&'a mut AutomationSequence<S>, AutomationError> {
    if state == AutomationState::Evaluating {
        tracing::warn!("Rejected write to {} during automation update", parameter);
        return Err(AutomationError::ChangeInProgress(parameter.full_id().to_string()));
    }
    sequences
        .get_mut(parameter)
        .ok_or_else(|| AutomationError::UnassignedParameter(parameter.full_id().to_string()))
}

#[derive(Debug, Serialize, Deserialize)]
struct DataRecord {
    #[serde(rename = "ActiveParameter", default)]
    active_parameter: Option<String>,
    #[serde(rename = "Sequences", default)]
    sequences: Vec<SequenceRecord>,
}

/// Parameter to sequence map for one automatable owner.
///
/// `S` is the owner's backing state, the type the update callbacks write into.
/// Sequences keep the order in which parameters were assigned.
pub struct AutomationData<S> {
    sequences: IndexMap<Parameter, AutomationSequence<S>>,
    active_parameter: Option<Parameter>,
    state: Cell<AutomationState>,
    handlers: Vec<ChangeHandler<S>>,
}

impl<S> Default for AutomationData<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> AutomationData<S> {
    /// Create empty automation data
    pub fn new() -> Self {
        Self {
            sequences: IndexMap::new(),
            active_parameter: None,
            state: Cell::new(AutomationState::Idle),
            handlers: Vec::new(),
        }
    }

    /// Assign a parameter to this owner, creating its sequence
    pub fn assign_key(&mut self, parameter: &Parameter, update: UpdateFn<S>) -> Result<(), AutomationError> {
        if self.is_change_in_progress() {
            return Err(AutomationError::ChangeInProgress(parameter.full_id().to_string()));
        }
        if self.sequences.contains_key(parameter) {
            return Err(AutomationError::DuplicateAssignment(parameter.full_id().to_string()));
        }
        self.sequences
            .insert(parameter.clone(), AutomationSequence::new(parameter.clone(), update));
        Ok(())
    }

    /// Sequence for an assigned parameter
    pub fn get_data(&self, parameter: &Parameter) -> Result<&AutomationSequence<S>, AutomationError> {
        self.sequences
            .get(parameter)
            .ok_or_else(|| AutomationError::UnassignedParameter(parameter.full_id().to_string()))
    }

    /// Sequence for a parameter, or `None` if it was never assigned
    pub fn try_get_data(&self, parameter: &Parameter) -> Option<&AutomationSequence<S>> {
        self.sequences.get(parameter)
    }

    /// Mutable sequence access, refused while evaluating
    pub fn sequence_mut(&mut self, parameter: &Parameter) -> Result<&mut AutomationSequence<S>, AutomationError> {
        let state = self.state.get();
        guarded_mut(&mut self.sequences, state, parameter)
    }

    /// Iterate sequences in assignment order
    pub fn sequences(&self) -> impl Iterator<Item = &AutomationSequence<S>> {
        self.sequences.values()
    }

    /// Assigned parameters in assignment order
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.sequences.keys()
    }

    /// Number of assigned parameters
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Whether nothing is assigned
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Whether the parameter is assigned and its sequence is in use
    pub fn is_automated(&self, parameter: &Parameter) -> bool {
        self.sequences
            .get(parameter)
            .is_some_and(AutomationSequence::is_automation_in_use)
    }

    /// Parameter currently selected for editing
    pub fn active_parameter(&self) -> Option<&Parameter> {
        self.active_parameter.as_ref()
    }

    /// Select (or clear) the parameter being edited
    pub fn set_active_parameter(&mut self, parameter: Option<&Parameter>) -> Result<(), AutomationError> {
        if let Some(parameter) = parameter {
            if !self.sequences.contains_key(parameter) {
                return Err(AutomationError::UnassignedParameter(parameter.full_id().to_string()));
            }
        }
        self.active_parameter = parameter.cloned();
        Ok(())
    }

    /// Current evaluation state
    pub fn state(&self) -> AutomationState {
        self.state.get()
    }

    /// Whether automation is currently writing into the owner
    pub fn is_change_in_progress(&self) -> bool {
        self.state.get() == AutomationState::Evaluating
    }

    /// Register a handler run after each automation write
    pub fn on_parameter_changed<F>(&mut self, handler: F)
    where
        F: FnMut(&ParameterChange, &mut SequenceAccess<'_, S>) + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Evaluate every in-use sequence at `frame` and write into `state`.
    ///
    /// Handlers run right after each write, before the next sequence is
    /// evaluated. Returns the number of sequences that wrote a value.
    pub fn update_all(&mut self, state: &mut S, frame: i64) -> Result<usize, AutomationError> {
        let _guard = EvaluationGuard::enter(&self.state)?;

        let mut written = 0;
        for index in 0..self.sequences.len() {
            let change = match self.sequences.get_index(index) {
                Some((parameter, sequence)) if sequence.is_automation_in_use() => sequence
                    .do_update_value(state, frame)
                    .map(|value| ParameterChange {
                        parameter: parameter.clone(),
                        frame,
                        value,
                    }),
                _ => None,
            };
            let Some(change) = change else {
                continue;
            };
            written += 1;

            let mut access = SequenceAccess {
                sequences: &mut self.sequences,
                state: AutomationState::Evaluating,
            };
            for handler in self.handlers.iter_mut() {
                handler(&change, &mut access);
            }
        }

        Ok(written)
    }

    /// Write every sequence's static value into `state`
    pub fn update_backing_storage(&mut self, state: &mut S) -> Result<(), AutomationError> {
        let _guard = EvaluationGuard::enter(&self.state)?;
        for sequence in self.sequences.values() {
            sequence.apply_static_value(state);
        }
        Ok(())
    }

    /// Persist all sequences and the active parameter
    pub fn serialize(&self) -> Result<serde_json::Value, AutomationError> {
        let record = DataRecord {
            active_parameter: self.active_parameter.as_ref().map(|p| p.full_id().to_string()),
            sequences: self.sequences.values().map(AutomationSequence::to_record).collect(),
        };
        Ok(serde_json::to_value(record)?)
    }

    /// Load sequences written by [`Self::serialize`].
    ///
    /// Every record is checked before anything is applied, so on error the
    /// data is left as it was.
    pub fn deserialize(&mut self, tree: &serde_json::Value, registry: &ParameterRegistry) -> Result<(), AutomationError> {
        if self.is_change_in_progress() {
            return Err(AutomationError::ChangeInProgress("automation data".to_string()));
        }
        let record: DataRecord = serde_json::from_value(tree.clone())?;

        let mut resolved = Vec::with_capacity(record.sequences.len());
        for sequence_record in record.sequences {
            let parameter = registry
                .lookup_full_id(&sequence_record.key_id)
                .ok_or_else(|| AutomationError::UnknownParameter(sequence_record.key_id.clone()))?;
            let sequence = self.get_data(&parameter)?;
            sequence.validate_record(&sequence_record)?;
            resolved.push((parameter, sequence_record));
        }

        for (parameter, sequence_record) in resolved {
            if let Some(sequence) = self.sequences.get_mut(&parameter) {
                sequence.apply_record(sequence_record);
            }
        }

        self.active_parameter = match record.active_parameter {
            Some(full_id) => match registry.lookup_full_id(&full_id) {
                Some(parameter) if self.sequences.contains_key(&parameter) => Some(parameter),
                _ => {
                    tracing::warn!("Dropping unknown active parameter {}", full_id);
                    None
                }
            },
            None => None,
        };
        Ok(())
    }

    /// Copy keyframes, override state and active parameter into `target`.
    ///
    /// Both sides must have the same parameters assigned in the same order.
    pub fn clone_into(&self, target: &mut AutomationData<S>) -> Result<(), AutomationError> {
        if target.is_change_in_progress() {
            return Err(AutomationError::ChangeInProgress("automation data".to_string()));
        }
        if !self.sequences.keys().eq(target.sequences.keys()) {
            return Err(AutomationError::StructureMismatch(format!(
                "{} parameters cannot be copied onto {}",
                self.sequences.len(),
                target.sequences.len()
            )));
        }

        for (source, dest) in self.sequences.values().zip(target.sequences.values_mut()) {
            dest.copy_from(source);
        }
        target.active_parameter = self.active_parameter.clone();
        Ok(())
    }
}

impl<S> Index<&Parameter> for AutomationData<S> {
    type Output = AutomationSequence<S>;

    /// Panics if the parameter was never assigned.
    fn index(&self, parameter: &Parameter) -> &Self::Output {
        match self.sequences.get(parameter) {
            Some(sequence) => sequence,
            None => panic!("Parameter not assigned on this owner: {parameter}"),
        }
    }
}

impl<S> fmt::Debug for AutomationData<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationData")
            .field("sequences", &self.sequences.values().collect::<Vec<_>>())
            .field("active_parameter", &self.active_parameter)
            .field("state", &self.state.get())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Lamp {
        brightness: f64,
        lit: bool,
    }

    fn set_brightness(lamp: &mut Lamp, value: &AutomationValue) {
        if let Some(v) = value.as_double() {
            lamp.brightness = v.clamp(0.0, 1.0);
        }
    }

    fn set_lit(lamp: &mut Lamp, value: &AutomationValue) {
        if let Some(v) = value.as_bool() {
            lamp.lit = v;
        }
    }

    struct Fixture {
        registry: ParameterRegistry,
        brightness: Parameter,
        lit: Parameter,
    }

    fn fixture() -> Fixture {
        let registry = ParameterRegistry::new();
        let brightness = registry.register_double("Lamp", "Brightness", 1.0, 0.0, 1.0).unwrap();
        let lit = registry.register_bool("Lamp", "IsLit", true).unwrap();
        Fixture {
            registry,
            brightness,
            lit,
        }
    }

    fn lamp_data(f: &Fixture) -> AutomationData<Lamp> {
        let mut data = AutomationData::new();
        data.assign_key(&f.brightness, set_brightness).unwrap();
        data.assign_key(&f.lit, set_lit).unwrap();
        data
    }

    #[test]
    fn test_duplicate_assignment_fails() {
        let f = fixture();
        let mut data = lamp_data(&f);
        assert_eq!(
            data.assign_key(&f.brightness, set_brightness),
            Err(AutomationError::DuplicateAssignment("Lamp::Brightness".to_string()))
        );
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_lookup_unassigned() {
        let f = fixture();
        let mut data = AutomationData::<Lamp>::new();
        data.assign_key(&f.brightness, set_brightness).unwrap();

        assert!(data.try_get_data(&f.lit).is_none());
        assert!(matches!(data.get_data(&f.lit), Err(AutomationError::UnassignedParameter(_))));
        assert_eq!(data[&f.brightness].parameter(), &f.brightness);
    }

    #[test]
    #[should_panic(expected = "not assigned")]
    fn test_index_unassigned_panics() {
        let f = fixture();
        let data = AutomationData::<Lamp>::new();
        let _ = &data[&f.lit];
    }

    #[test]
    fn test_update_all_skips_unused_sequences() {
        let f = fixture();
        let mut data = lamp_data(&f);
        data.sequence_mut(&f.brightness)
            .unwrap()
            .add_key_frame(0, AutomationValue::Double(0.2))
            .unwrap();

        let mut lamp = Lamp {
            brightness: 0.9,
            lit: false,
        };
        assert_eq!(data.update_all(&mut lamp, 10).unwrap(), 1);
        assert_eq!(lamp.brightness, 0.2);
        assert!(!lamp.lit);
        assert_eq!(data.state(), AutomationState::Idle);
        assert!(data.is_automated(&f.brightness));
        assert!(!data.is_automated(&f.lit));
    }

    #[test]
    fn test_handler_writes_rejected_during_evaluation() {
        let f = fixture();
        let mut data = lamp_data(&f);
        data.sequence_mut(&f.brightness)
            .unwrap()
            .add_key_frame(0, AutomationValue::Double(0.6))
            .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        data.on_parameter_changed(move |change, access| {
            assert_eq!(access.state(), AutomationState::Evaluating);
            let result = access
                .sequence_mut(&change.parameter)
                .map(|sequence| sequence.add_key_frame(0, AutomationValue::Double(0.0)));
            log.borrow_mut().push((change.value, result.is_err()));
        });

        let mut lamp = Lamp::default();
        data.update_all(&mut lamp, 0).unwrap();

        assert_eq!(*seen.borrow(), vec![(AutomationValue::Double(0.6), true)]);
        assert_eq!(lamp.brightness, 0.6);
        assert_eq!(
            data[&f.brightness].key_frame_at(0).map(|k| k.value()),
            Some(AutomationValue::Double(0.6))
        );
        assert_eq!(data.state(), AutomationState::Idle);
        assert!(data.sequence_mut(&f.brightness).is_ok());
    }

    thread_local! {
        static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn logged_brightness(lamp: &mut Lamp, value: &AutomationValue) {
        set_brightness(lamp, value);
        EVENTS.with(|events| events.borrow_mut().push("write Brightness".to_string()));
    }

    fn logged_lit(lamp: &mut Lamp, value: &AutomationValue) {
        set_lit(lamp, value);
        EVENTS.with(|events| events.borrow_mut().push("write IsLit".to_string()));
    }

    #[test]
    fn test_handlers_run_after_each_write() {
        let f = fixture();
        let mut data = AutomationData::<Lamp>::new();
        data.assign_key(&f.brightness, logged_brightness).unwrap();
        data.assign_key(&f.lit, logged_lit).unwrap();
        data.sequence_mut(&f.brightness)
            .unwrap()
            .add_key_frame(0, AutomationValue::Double(0.3))
            .unwrap();
        data.sequence_mut(&f.lit)
            .unwrap()
            .add_key_frame(0, AutomationValue::Bool(false))
            .unwrap();
        data.on_parameter_changed(|change, _| {
            let name = change.parameter.key().name().to_string();
            EVENTS.with(|events| events.borrow_mut().push(format!("notify {name}")));
        });

        EVENTS.with(|events| events.borrow_mut().clear());
        let mut lamp = Lamp::default();
        assert_eq!(data.update_all(&mut lamp, 4).unwrap(), 2);

        let events = EVENTS.with(|events| events.borrow().clone());
        assert_eq!(
            events,
            vec!["write Brightness", "notify Brightness", "write IsLit", "notify IsLit"]
        );
    }

    #[test]
    fn test_guard_rejects_reentry_and_resets() {
        let state = Cell::new(AutomationState::Idle);
        {
            let _outer = EvaluationGuard::enter(&state).unwrap();
            assert_eq!(state.get(), AutomationState::Evaluating);
            assert!(matches!(
                EvaluationGuard::enter(&state),
                Err(AutomationError::ReentrantEvaluation)
            ));
        }
        assert_eq!(state.get(), AutomationState::Idle);
    }

    #[test]
    fn test_serialize_round_trip() {
        let f = fixture();
        let mut data = lamp_data(&f);
        {
            let sequence = data.sequence_mut(&f.brightness).unwrap();
            sequence.add_key_frame(30, AutomationValue::Double(0.75)).unwrap();
            sequence.add_key_frame(10, AutomationValue::Double(0.25)).unwrap();
        }
        data.sequence_mut(&f.lit).unwrap().set_override_enabled(true);
        data.set_active_parameter(Some(&f.lit)).unwrap();

        let tree = data.serialize().unwrap();
        assert!(tree.get("Sequences").is_some());

        let mut restored = lamp_data(&f);
        restored.deserialize(&tree, &f.registry).unwrap();

        let frames: Vec<(i64, AutomationValue)> = restored[&f.brightness]
            .key_frames()
            .iter()
            .map(|k| (k.frame(), k.value()))
            .collect();
        assert_eq!(
            frames,
            vec![(10, AutomationValue::Double(0.25)), (30, AutomationValue::Double(0.75))]
        );
        assert!(restored[&f.lit].is_override_enabled());
        assert_eq!(restored.active_parameter(), Some(&f.lit));
    }

    #[test]
    fn test_deserialize_unknown_parameter_leaves_data_untouched() {
        let f = fixture();
        let mut data = lamp_data(&f);
        data.sequence_mut(&f.brightness)
            .unwrap()
            .add_key_frame(5, AutomationValue::Double(0.5))
            .unwrap();

        let tree = serde_json::json!({
            "ActiveParameter": null,
            "Sequences": [
                {
                    "KeyId": "Lamp::Brightness",
                    "data_type": "Double",
                    "override_enabled": false,
                    "override_value": { "Double": 1.0 },
                    "key_frames": []
                },
                {
                    "KeyId": "Lamp::Missing",
                    "data_type": "Double",
                    "override_enabled": false,
                    "override_value": { "Double": 1.0 },
                    "key_frames": []
                }
            ]
        });

        assert_eq!(
            data.deserialize(&tree, &f.registry),
            Err(AutomationError::UnknownParameter("Lamp::Missing".to_string()))
        );
        assert_eq!(data[&f.brightness].key_frame_count(), 1);
    }

    #[test]
    fn test_deserialize_type_mismatch_leaves_data_untouched() {
        let f = fixture();
        let mut data = lamp_data(&f);
        data.sequence_mut(&f.brightness)
            .unwrap()
            .add_key_frame(5, AutomationValue::Double(0.5))
            .unwrap();

        let wrong_type = serde_json::json!({
            "Sequences": [
                {
                    "KeyId": "Lamp::Brightness",
                    "data_type": "Bool",
                    "override_enabled": true,
                    "override_value": { "Bool": true },
                    "key_frames": []
                }
            ]
        });
        assert!(matches!(
            data.deserialize(&wrong_type, &f.registry),
            Err(AutomationError::TypeMismatch { .. })
        ));

        let wrong_key_frame = serde_json::json!({
            "Sequences": [
                {
                    "KeyId": "Lamp::IsLit",
                    "data_type": "Bool",
                    "override_enabled": true,
                    "override_value": { "Bool": false },
                    "key_frames": []
                },
                {
                    "KeyId": "Lamp::Brightness",
                    "data_type": "Double",
                    "override_enabled": false,
                    "override_value": { "Double": 1.0 },
                    "key_frames": [
                        { "frame": 0, "value": { "Double": 0.1 } },
                        { "frame": 9, "value": { "Long": 3 } }
                    ]
                }
            ]
        });
        assert!(matches!(
            data.deserialize(&wrong_key_frame, &f.registry),
            Err(AutomationError::TypeMismatch { .. })
        ));

        assert_eq!(data[&f.brightness].key_frame_count(), 1);
        assert_eq!(
            data[&f.brightness].key_frame_at(5).map(|k| k.value()),
            Some(AutomationValue::Double(0.5))
        );
        assert!(!data[&f.lit].is_override_enabled());
    }

    #[test]
    fn test_deserialize_unassigned_parameter() {
        let f = fixture();
        let mut source = lamp_data(&f);
        source.sequence_mut(&f.lit).unwrap().set_override_enabled(true);
        let tree = source.serialize().unwrap();

        let mut target = AutomationData::<Lamp>::new();
        target.assign_key(&f.brightness, set_brightness).unwrap();
        assert!(matches!(
            target.deserialize(&tree, &f.registry),
            Err(AutomationError::UnassignedParameter(_))
        ));
    }

    #[test]
    fn test_clone_into() {
        let f = fixture();
        let mut source = lamp_data(&f);
        source
            .sequence_mut(&f.brightness)
            .unwrap()
            .add_key_frame(3, AutomationValue::Double(0.1))
            .unwrap();

        let mut target = lamp_data(&f);
        source.clone_into(&mut target).unwrap();
        assert_eq!(target[&f.brightness].key_frames(), source[&f.brightness].key_frames());

        let mut reordered = AutomationData::<Lamp>::new();
        reordered.assign_key(&f.lit, set_lit).unwrap();
        reordered.assign_key(&f.brightness, set_brightness).unwrap();
        assert!(matches!(
            source.clone_into(&mut reordered),
            Err(AutomationError::StructureMismatch(_))
        ));
    }

    #[test]
    fn test_update_backing_storage_uses_static_values() {
        let f = fixture();
        let mut data = lamp_data(&f);
        data.sequence_mut(&f.brightness)
            .unwrap()
            .set_override_value(AutomationValue::Double(0.4))
            .unwrap();

        let mut lamp = Lamp::default();
        data.update_backing_storage(&mut lamp).unwrap();
        assert_eq!(lamp.brightness, 0.4);
        assert!(lamp.lit);
    }
}
