// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed values carried by keyframes and parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The data type of an automatable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomationDataType {
    /// Boolean (stepped)
    Bool,
    /// 64-bit integer
    Long,
    /// Single precision float
    Float,
    /// Double precision float
    Double,
    /// 2D vector
    Vector2,
}

impl AutomationDataType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Vector2 => "Vector2",
        }
    }

    /// Whether values of this type blend between keyframes
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Bool)
    }
}

impl fmt::Display for AutomationDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value stored in a keyframe or written into an owner's state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AutomationValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Long(i64),
    /// Float value
    Float(f32),
    /// Double value
    Double(f64),
    /// 2D vector
    Vector2([f32; 2]),
}

impl AutomationValue {
    /// The zero value of a data type
    pub fn zero(data_type: AutomationDataType) -> Self {
        match data_type {
            AutomationDataType::Bool => Self::Bool(false),
            AutomationDataType::Long => Self::Long(0),
            AutomationDataType::Float => Self::Float(0.0),
            AutomationDataType::Double => Self::Double(0.0),
            AutomationDataType::Vector2 => Self::Vector2([0.0, 0.0]),
        }
    }

    /// Get the data type of this value
    pub fn data_type(&self) -> AutomationDataType {
        match self {
            Self::Bool(_) => AutomationDataType::Bool,
            Self::Long(_) => AutomationDataType::Long,
            Self::Float(_) => AutomationDataType::Float,
            Self::Double(_) => AutomationDataType::Double,
            Self::Vector2(_) => AutomationDataType::Vector2,
        }
    }

    /// Blend towards `other` by `t` in `[0, 1]`.
    ///
    /// Numeric types blend linearly (`Long` rounds to the nearest integer),
    /// booleans hold `self`. Returns `None` for mismatched types.
    pub fn lerp(&self, other: &AutomationValue, t: f64) -> Option<AutomationValue> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(_)) => Some(Self::Bool(*a)),
            (Self::Long(a), Self::Long(b)) => {
                let blended = *a as f64 + (*b as f64 - *a as f64) * t;
                Some(Self::Long(blended.round() as i64))
            }
            (Self::Float(a), Self::Float(b)) => {
                Some(Self::Float((*a as f64 + (*b as f64 - *a as f64) * t) as f32))
            }
            (Self::Double(a), Self::Double(b)) => Some(Self::Double(a + (b - a) * t)),
            (Self::Vector2(a), Self::Vector2(b)) => {
                let t = t as f32;
                Some(Self::Vector2([a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]))
            }
            _ => None,
        }
    }

    /// Get as bool if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as integer if possible
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float if possible
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as double if possible
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vector2 if possible
    pub fn as_vector2(&self) -> Option<[f32; 2]> {
        match self {
            Self::Vector2(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for AutomationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Vector2([x, y]) => write!(f, "({x}, {y})"),
        }
    }
}

impl From<bool> for AutomationValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AutomationValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for AutomationValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for AutomationValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<[f32; 2]> for AutomationValue {
    fn from(value: [f32; 2]) -> Self {
        Self::Vector2(value)
    }
}
