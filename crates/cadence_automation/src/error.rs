// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for parameter registration and automation.

use crate::value::AutomationDataType;

/// Error raised by the parameter registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// A parameter with the same domain and name already exists
    #[error("Parameter already registered: {0}")]
    DuplicateParameter(String),

    /// Domain or name is not usable as part of a full id
    #[error("Invalid parameter key '{domain}::{name}': {reason}")]
    InvalidParameterKey {
        /// Requested domain
        domain: String,
        /// Requested name
        name: String,
        /// Why the key was rejected
        reason: &'static str,
    },

    /// No parameter is registered under the full id
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Default/min/max are inconsistent
    #[error("Invalid parameter descriptor: {0}")]
    InvalidDescriptor(String),
}

/// Error raised by automation sequences and automation data
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AutomationError {
    /// The parameter already has a sequence on this owner
    #[error("Parameter already assigned on this owner: {0}")]
    DuplicateAssignment(String),

    /// The parameter was never assigned on this owner
    #[error("Parameter not assigned on this owner: {0}")]
    UnassignedParameter(String),

    /// Persisted data references a parameter the registry does not know
    #[error("Unknown automation parameter: {0}")]
    UnknownParameter(String),

    /// A value does not match the parameter's data type
    #[error("Invalid data type for {parameter}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Full id of the parameter
        parameter: String,
        /// The parameter's data type
        expected: AutomationDataType,
        /// The data type that was supplied
        actual: AutomationDataType,
    },

    /// Keyframe frames must be non-negative
    #[error("Keyframe frame must be non-negative: {0}")]
    InvalidFrame(i64),

    /// The owner is being evaluated; the write was rejected
    #[error("Automation change in progress, write to {0} rejected")]
    ChangeInProgress(String),

    /// The owner was entered for evaluation while already evaluating
    #[error("Owner is already being evaluated")]
    ReentrantEvaluation,

    /// Source and target automation data differ in parameters or order
    #[error("Automation data structure mismatch: {0}")]
    StructureMismatch(String),

    /// The structured tree could not be read
    #[error("Malformed automation tree: {0}")]
    MalformedTree(String),
}

impl From<serde_json::Error> for AutomationError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedTree(err.to_string())
    }
}
