// SPDX-License-Identifier: MIT OR Apache-2.0
//! The owner side of automation.

use crate::data::AutomationData;
use crate::error::AutomationError;

/// An object whose state can be driven by automation.
///
/// Implementors keep their [`AutomationData`] and the state it writes into
/// as separate fields and hand out both at once.
pub trait Automatable {
    /// Backing state written by the update callbacks
    type State;

    /// The owner's automation data
    fn automation_data(&self) -> &AutomationData<Self::State>;

    /// Automation data and backing state, borrowed together
    fn automation_parts(&mut self) -> (&mut AutomationData<Self::State>, &mut Self::State);

    /// Whether automation is currently writing into this owner
    fn is_automation_change_in_progress(&self) -> bool {
        self.automation_data().is_change_in_progress()
    }
}

/// Evaluate every in-use sequence of `owner` at `frame`.
///
/// `frame` is in the owner's own frame space. Returns how many sequences
/// wrote a value.
pub fn evaluate_owner<O>(owner: &mut O, frame: i64) -> Result<usize, AutomationError>
where
    O: Automatable + ?Sized,
{
    let (data, state) = owner.automation_parts();
    let updated = data.update_all(state, frame)?;
    tracing::trace!(frame, updated, "Evaluated automation owner");
    Ok(updated)
}

/// Write every sequence's static value into `owner`'s state
pub fn refresh_backing_storage<O>(owner: &mut O) -> Result<(), AutomationError>
where
    O: Automatable + ?Sized,
{
    let (data, state) = owner.automation_parts();
    data.update_backing_storage(state)
}
