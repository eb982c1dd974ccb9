// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter registry.
//!
//! Every automatable property is described by a [`Parameter`]: a `(domain,
//! name)` identity plus an immutable [`ParameterDescriptor`] holding the
//! default value, the valid range and the data type. Parameters are created
//! through a [`ParameterRegistry`], which owns the id namespace. The registry
//! is an ordinary object handed to construction sites, so independent
//! registries never observe each other.

use crate::error::RegistryError;
use crate::value::{AutomationDataType, AutomationValue};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Separator between domain and name in a full id. Part of the persisted format.
pub const FULL_ID_SEPARATOR: &str = "::";

/// Identity of a parameter: a domain (usually the owner type) and a name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterKey {
    domain: String,
    name: String,
}

impl ParameterKey {
    /// Create a key, validating both parts
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Result<Self, RegistryError> {
        let domain = domain.into();
        let name = name.into();

        let reason = if domain.trim().is_empty() {
            Some("domain cannot be empty")
        } else if name.trim().is_empty() {
            Some("name cannot be empty")
        } else if domain.contains(FULL_ID_SEPARATOR) || name.contains(FULL_ID_SEPARATOR) {
            Some("parts cannot contain the full id separator")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(RegistryError::InvalidParameterKey { domain, name, reason }),
            None => Ok(Self { domain, name }),
        }
    }

    /// Parse a full id of the form `domain::name`
    pub fn parse(full_id: &str) -> Result<Self, RegistryError> {
        let Some((domain, name)) = full_id.split_once(FULL_ID_SEPARATOR) else {
            return Err(RegistryError::InvalidParameterKey {
                domain: full_id.to_string(),
                name: String::new(),
                reason: "missing the full id separator",
            });
        };
        Self::new(domain, name)
    }

    /// The domain part
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The name part
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full id, `domain::name`
    pub fn full_id(&self) -> String {
        format!("{}{}{}", self.domain, FULL_ID_SEPARATOR, self.name)
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.domain, FULL_ID_SEPARATOR, self.name)
    }
}

/// Default value and valid range of a parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    default_value: AutomationValue,
    minimum: AutomationValue,
    maximum: AutomationValue,
}

impl ParameterDescriptor {
    /// Create a descriptor. All three values must share a data type and
    /// `minimum` must not exceed `maximum`. The default is clamped into range.
    pub fn new(
        default_value: AutomationValue,
        minimum: AutomationValue,
        maximum: AutomationValue,
    ) -> Result<Self, RegistryError> {
        let data_type = default_value.data_type();
        if minimum.data_type() != data_type || maximum.data_type() != data_type {
            return Err(RegistryError::InvalidDescriptor(format!(
                "default is {data_type} but range is {}..{}",
                minimum.data_type(),
                maximum.data_type()
            )));
        }

        let ordered = match (minimum, maximum) {
            (AutomationValue::Long(min), AutomationValue::Long(max)) => min <= max,
            (AutomationValue::Float(min), AutomationValue::Float(max)) => min <= max,
            (AutomationValue::Double(min), AutomationValue::Double(max)) => min <= max,
            (AutomationValue::Vector2(min), AutomationValue::Vector2(max)) => {
                min[0] <= max[0] && min[1] <= max[1]
            }
            _ => true,
        };
        if !ordered {
            return Err(RegistryError::InvalidDescriptor(format!(
                "minimum {minimum} exceeds maximum {maximum}"
            )));
        }

        let mut descriptor = Self {
            default_value,
            minimum,
            maximum,
        };
        descriptor.default_value = descriptor.clamp(default_value);
        Ok(descriptor)
    }

    /// A boolean descriptor
    pub fn boolean(default_value: bool) -> Self {
        Self {
            default_value: AutomationValue::Bool(default_value),
            minimum: AutomationValue::Bool(false),
            maximum: AutomationValue::Bool(true),
        }
    }

    /// An integer descriptor
    pub fn long(default_value: i64, minimum: i64, maximum: i64) -> Result<Self, RegistryError> {
        Self::new(default_value.into(), minimum.into(), maximum.into())
    }

    /// A float descriptor
    pub fn float(default_value: f32, minimum: f32, maximum: f32) -> Result<Self, RegistryError> {
        Self::new(default_value.into(), minimum.into(), maximum.into())
    }

    /// A double descriptor
    pub fn double(default_value: f64, minimum: f64, maximum: f64) -> Result<Self, RegistryError> {
        Self::new(default_value.into(), minimum.into(), maximum.into())
    }

    /// A 2D vector descriptor
    pub fn vector2(
        default_value: [f32; 2],
        minimum: [f32; 2],
        maximum: [f32; 2],
    ) -> Result<Self, RegistryError> {
        Self::new(default_value.into(), minimum.into(), maximum.into())
    }

    /// The data type of the parameter
    pub fn data_type(&self) -> AutomationDataType {
        self.default_value.data_type()
    }

    /// The default value
    pub fn default_value(&self) -> AutomationValue {
        self.default_value
    }

    /// The minimum value
    pub fn minimum(&self) -> AutomationValue {
        self.minimum
    }

    /// The maximum value
    pub fn maximum(&self) -> AutomationValue {
        self.maximum
    }

    /// Clamp a value into `[minimum, maximum]`.
    ///
    /// Vectors clamp per component; booleans and values of another data type
    /// are returned unchanged.
    pub fn clamp(&self, value: AutomationValue) -> AutomationValue {
        match (value, self.minimum, self.maximum) {
            (AutomationValue::Long(v), AutomationValue::Long(min), AutomationValue::Long(max)) => {
                AutomationValue::Long(v.clamp(min, max))
            }
            (AutomationValue::Float(v), AutomationValue::Float(min), AutomationValue::Float(max)) => {
                AutomationValue::Float(v.clamp(min, max))
            }
            (
                AutomationValue::Double(v),
                AutomationValue::Double(min),
                AutomationValue::Double(max),
            ) => AutomationValue::Double(v.clamp(min, max)),
            (
                AutomationValue::Vector2(v),
                AutomationValue::Vector2(min),
                AutomationValue::Vector2(max),
            ) => AutomationValue::Vector2([v[0].clamp(min[0], max[0]), v[1].clamp(min[1], max[1])]),
            _ => value,
        }
    }
}

#[derive(Debug)]
struct ParameterInner {
    key: ParameterKey,
    full_id: String,
    descriptor: ParameterDescriptor,
    index: usize,
}

/// Handle to a registered parameter.
///
/// Cheap to clone. Two handles are equal only if they come from the same
/// registration.
#[derive(Clone)]
pub struct Parameter(Arc<ParameterInner>);

impl Parameter {
    /// The parameter's key
    pub fn key(&self) -> &ParameterKey {
        &self.0.key
    }

    /// The full id, `domain::name`
    pub fn full_id(&self) -> &str {
        &self.0.full_id
    }

    /// The descriptor
    pub fn descriptor(&self) -> &ParameterDescriptor {
        &self.0.descriptor
    }

    /// The data type
    pub fn data_type(&self) -> AutomationDataType {
        self.0.descriptor.data_type()
    }

    /// The default value
    pub fn default_value(&self) -> AutomationValue {
        self.0.descriptor.default_value()
    }

    /// Clamp a value with the descriptor
    pub fn clamp(&self, value: AutomationValue) -> AutomationValue {
        self.0.descriptor.clamp(value)
    }

    /// Registration order within the owning registry
    pub fn index(&self) -> usize {
        self.0.index
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter({}: {})", self.0.full_id, self.data_type())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.full_id)
    }
}

/// Registry of automatable parameters, keyed by full id
#[derive(Default)]
pub struct ParameterRegistry {
    parameters: RwLock<IndexMap<String, Parameter>>,
}

impl ParameterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter. Fails if `(domain, name)` is already registered.
    pub fn register(
        &self,
        domain: &str,
        name: &str,
        descriptor: ParameterDescriptor,
    ) -> Result<Parameter, RegistryError> {
        let key = ParameterKey::new(domain, name)?;
        let full_id = key.full_id();

        let mut parameters = self.parameters.write();
        if parameters.contains_key(&full_id) {
            return Err(RegistryError::DuplicateParameter(full_id));
        }

        let parameter = Parameter(Arc::new(ParameterInner {
            key,
            full_id: full_id.clone(),
            descriptor,
            index: parameters.len(),
        }));
        parameters.insert(full_id, parameter.clone());

        tracing::debug!(parameter = %parameter, data_type = %parameter.data_type(), "Registered automation parameter");
        Ok(parameter)
    }

    /// Register a boolean parameter
    pub fn register_bool(&self, domain: &str, name: &str, default_value: bool) -> Result<Parameter, RegistryError> {
        self.register(domain, name, ParameterDescriptor::boolean(default_value))
    }

    /// Register an integer parameter
    pub fn register_long(
        &self,
        domain: &str,
        name: &str,
        default_value: i64,
        minimum: i64,
        maximum: i64,
    ) -> Result<Parameter, RegistryError> {
        self.register(domain, name, ParameterDescriptor::long(default_value, minimum, maximum)?)
    }

    /// Register a float parameter
    pub fn register_float(
        &self,
        domain: &str,
        name: &str,
        default_value: f32,
        minimum: f32,
        maximum: f32,
    ) -> Result<Parameter, RegistryError> {
        self.register(domain, name, ParameterDescriptor::float(default_value, minimum, maximum)?)
    }

    /// Register a double parameter
    pub fn register_double(
        &self,
        domain: &str,
        name: &str,
        default_value: f64,
        minimum: f64,
        maximum: f64,
    ) -> Result<Parameter, RegistryError> {
        self.register(domain, name, ParameterDescriptor::double(default_value, minimum, maximum)?)
    }

    /// Register a 2D vector parameter
    pub fn register_vector2(
        &self,
        domain: &str,
        name: &str,
        default_value: [f32; 2],
        minimum: [f32; 2],
        maximum: [f32; 2],
    ) -> Result<Parameter, RegistryError> {
        self.register(domain, name, ParameterDescriptor::vector2(default_value, minimum, maximum)?)
    }

    /// Look up a parameter by domain and name
    pub fn lookup(&self, domain: &str, name: &str) -> Option<Parameter> {
        self.lookup_full_id(&format!("{domain}{FULL_ID_SEPARATOR}{name}"))
    }

    /// Look up a parameter by full id
    pub fn lookup_full_id(&self, full_id: &str) -> Option<Parameter> {
        self.parameters.read().get(full_id).cloned()
    }

    /// Look up a parameter by full id, failing if it is unknown
    pub fn get_by_full_id(&self, full_id: &str) -> Result<Parameter, RegistryError> {
        self.lookup_full_id(full_id)
            .ok_or_else(|| RegistryError::UnknownParameter(full_id.to_string()))
    }

    /// All parameters in registration order
    pub fn parameters(&self) -> Vec<Parameter> {
        self.parameters.read().values().cloned().collect()
    }

    /// Number of registered parameters
    pub fn len(&self) -> usize {
        self.parameters.read().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.parameters.read().is_empty()
    }
}

impl fmt::Debug for ParameterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterRegistry")
            .field("parameters", &self.parameters.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = ParameterRegistry::new();
        let opacity = registry.register_double("Clip", "Opacity", 1.0, 0.0, 1.0).unwrap();

        assert_eq!(opacity.full_id(), "Clip::Opacity");
        assert_eq!(opacity.data_type(), AutomationDataType::Double);
        assert_eq!(registry.lookup("Clip", "Opacity"), Some(opacity.clone()));
        assert_eq!(registry.lookup_full_id("Clip::Opacity"), Some(opacity));
        assert!(registry.lookup("Clip", "Volume").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = ParameterRegistry::new();
        registry.register_bool("Track", "IsVisible", true).unwrap();

        let err = registry.register_bool("Track", "IsVisible", false).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateParameter("Track::IsVisible".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let registry = ParameterRegistry::new();
        assert!(registry.register_bool("", "Name", false).is_err());
        assert!(registry.register_bool("Domain", "  ", false).is_err());
        assert!(registry.register_bool("Dom::ain", "Name", false).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registries_are_independent() {
        let a = ParameterRegistry::new();
        let b = ParameterRegistry::new();
        let pa = a.register_float("Track", "Volume", 1.0, 0.0, 1.0).unwrap();
        let pb = b.register_float("Track", "Volume", 1.0, 0.0, 1.0).unwrap();

        assert_ne!(pa, pb);
        assert!(b.lookup("Track", "Volume").is_some());
    }

    #[test]
    fn test_descriptor_clamp() {
        let descriptor = ParameterDescriptor::double(0.5, 0.0, 1.0).unwrap();
        assert_eq!(descriptor.clamp(AutomationValue::Double(1.5)), AutomationValue::Double(1.0));
        assert_eq!(descriptor.clamp(AutomationValue::Double(-2.0)), AutomationValue::Double(0.0));

        let scale = ParameterDescriptor::vector2([1.0, 1.0], [0.0, 0.0], [10.0, 10.0]).unwrap();
        assert_eq!(
            scale.clamp(AutomationValue::Vector2([-1.0, 20.0])),
            AutomationValue::Vector2([0.0, 10.0])
        );

        let flag = ParameterDescriptor::boolean(true);
        assert_eq!(flag.clamp(AutomationValue::Bool(false)), AutomationValue::Bool(false));
    }

    #[test]
    fn test_descriptor_validation() {
        assert!(ParameterDescriptor::long(0, 10, 5).is_err());
        assert!(ParameterDescriptor::new(
            AutomationValue::Float(0.0),
            AutomationValue::Double(0.0),
            AutomationValue::Double(1.0),
        )
        .is_err());

        let clamped_default = ParameterDescriptor::float(5.0, 0.0, 1.0).unwrap();
        assert_eq!(clamped_default.default_value(), AutomationValue::Float(1.0));
    }

    #[test]
    fn test_key_parse() {
        let key = ParameterKey::parse("MotionEffect::Position").unwrap();
        assert_eq!(key.domain(), "MotionEffect");
        assert_eq!(key.name(), "Position");
        assert_eq!(key.to_string(), "MotionEffect::Position");
        assert!(matches!(
            ParameterKey::parse("NoSeparator"),
            Err(RegistryError::InvalidParameterKey { .. })
        ));
    }
}
