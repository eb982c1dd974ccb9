// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter automation for Cadence.
//!
//! This crate provides keyframe automation for timeline objects:
//! - Typed parameter registry
//! - Keyframes with linear, hold and curved interpolation
//! - Per-parameter automation sequences with override values
//! - Per-owner automation data with a re-entrancy guard
//!
//! ## Architecture
//!
//! Owners implement [`Automatable`], keeping their [`AutomationData`] next to
//! the state it writes into. [`evaluate_owner`] drives one owner at one frame;
//! walking a whole timeline is left to the timeline crate.

pub mod automatable;
pub mod data;
pub mod error;
pub mod keyframe;
pub mod registry;
pub mod sequence;
pub mod value;

pub use automatable::{evaluate_owner, refresh_backing_storage, Automatable};
pub use data::{AutomationData, AutomationState, ChangeHandler, ParameterChange, SequenceAccess};
pub use error::{AutomationError, RegistryError};
pub use keyframe::{Interpolation, InterpolationMode, Keyframe};
pub use registry::{Parameter, ParameterDescriptor, ParameterKey, ParameterRegistry, FULL_ID_SEPARATOR};
pub use sequence::{AutomationSequence, UpdateFn};
pub use value::{AutomationDataType, AutomationValue};
