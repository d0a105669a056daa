//! Parameter registry for managing runtime configuration
//!
//! This module provides a minimal parameter registry for storing and managing
//! tracker configuration parameters. Each parameter carries its type, default
//! and allowed range so writes from a ground station can be validated.

/// Maximum number of registered parameters
pub const MAX_PARAMS: usize = 64;

/// Maximum parameter name length (MAVLink param_id field)
pub const MAX_NAME_LEN: usize = 16;

/// Parameter type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamType {
    /// 32-bit floating point parameter
    Float,
    /// 32-bit unsigned integer parameter
    Uint32,
}

/// Parameter value (union of supported types)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamValue {
    /// Float value
    Float(f32),
    /// Unsigned integer value
    Uint32(u32),
}

impl ParamValue {
    /// Get parameter type
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Float(_) => ParamType::Float,
            ParamValue::Uint32(_) => ParamType::Uint32,
        }
    }

    /// Value as f32, the representation used by PARAM_VALUE/PARAM_SET
    pub fn as_f32(self) -> f32 {
        match self {
            ParamValue::Float(f) => f,
            ParamValue::Uint32(u) => u as f32,
        }
    }

    /// Value as u32, truncating floats
    pub fn as_u32(self) -> u32 {
        match self {
            ParamValue::Float(f) if f > 0.0 => f as u32,
            ParamValue::Float(_) => 0,
            ParamValue::Uint32(u) => u,
        }
    }

    /// Interpret a wire float as a value of `param_type`
    ///
    /// Returns `None` if an integer parameter receives a negative or
    /// fractional value.
    pub fn from_f32(value: f32, param_type: ParamType) -> Option<Self> {
        match param_type {
            ParamType::Float => Some(ParamValue::Float(value)),
            ParamType::Uint32 => {
                if value < 0.0 || libm::truncf(value) != value {
                    None
                } else {
                    Some(ParamValue::Uint32(value as u32))
                }
            }
        }
    }
}

/// Parameter metadata (definition and current value)
#[derive(Debug, Clone)]
pub struct ParamMetadata {
    /// Parameter name (max 16 characters, MAVLink standard)
    pub name: &'static str,
    /// Parameter type
    pub param_type: ParamType,
    /// Current value
    pub value: ParamValue,
    /// Default value
    pub default: ParamValue,
    /// Minimum allowed value
    pub min: ParamValue,
    /// Maximum allowed value
    pub max: ParamValue,
    /// Modified flag (true if changed from default this session)
    pub modified: bool,
}

impl ParamMetadata {
    /// Create new parameter metadata with Float type
    pub const fn new_float(name: &'static str, default: f32, min: f32, max: f32) -> Self {
        Self {
            name,
            param_type: ParamType::Float,
            value: ParamValue::Float(default),
            default: ParamValue::Float(default),
            min: ParamValue::Float(min),
            max: ParamValue::Float(max),
            modified: false,
        }
    }

    /// Create new parameter metadata with Uint32 type
    pub const fn new_uint32(name: &'static str, default: u32, min: u32, max: u32) -> Self {
        Self {
            name,
            param_type: ParamType::Uint32,
            value: ParamValue::Uint32(default),
            default: ParamValue::Uint32(default),
            min: ParamValue::Uint32(min),
            max: ParamValue::Uint32(max),
            modified: false,
        }
    }

    /// Validate value is within bounds
    pub fn is_valid(&self, value: ParamValue) -> bool {
        if value.param_type() != self.param_type {
            return false;
        }

        match (value, self.min, self.max) {
            (ParamValue::Float(v), ParamValue::Float(min), ParamValue::Float(max)) => {
                v >= min && v <= max
            }
            (ParamValue::Uint32(v), ParamValue::Uint32(min), ParamValue::Uint32(max)) => {
                v >= min && v <= max
            }
            _ => false,
        }
    }
}

/// Parameter registry error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Parameter not found
    NotFound,
    /// Invalid parameter value (out of bounds or wrong type)
    InvalidValue,
    /// Parameter list full
    Full,
    /// A parameter with the same name is already registered
    Duplicate,
}

impl core::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RegistryError::NotFound => write!(f, "parameter not found"),
            RegistryError::InvalidValue => write!(f, "parameter value out of range"),
            RegistryError::Full => write!(f, "parameter registry full"),
            RegistryError::Duplicate => write!(f, "parameter already registered"),
        }
    }
}

/// In-memory parameter registry
#[derive(Debug, Default)]
pub struct ParameterRegistry {
    /// Parameter metadata array, in registration order
    params: heapless::Vec<ParamMetadata, MAX_PARAMS>,
}

impl ParameterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            params: heapless::Vec::new(),
        }
    }

    /// Register a parameter
    pub fn register(&mut self, param: ParamMetadata) -> Result<(), RegistryError> {
        if param.name.len() > MAX_NAME_LEN {
            return Err(RegistryError::InvalidValue);
        }
        if self.index_of(param.name).is_some() {
            return Err(RegistryError::Duplicate);
        }
        self.params.push(param).map_err(|_| RegistryError::Full)
    }

    /// Get parameter count
    pub fn count(&self) -> usize {
        self.params.len()
    }

    /// Index of the named parameter
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// Get parameter by name
    pub fn get_by_name(&self, name: &str) -> Option<&ParamMetadata> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Get parameter by index
    pub fn get_by_index(&self, index: usize) -> Option<&ParamMetadata> {
        self.params.get(index)
    }

    /// Current value of a named parameter
    pub fn value(&self, name: &str) -> Option<ParamValue> {
        self.get_by_name(name).map(|p| p.value)
    }

    /// Current value of a named integer parameter, or `default` if missing
    pub fn get_u32_or(&self, name: &str, default: u32) -> u32 {
        self.value(name).map(ParamValue::as_u32).unwrap_or(default)
    }

    /// Set parameter by name
    pub fn set_by_name(&mut self, name: &str, value: ParamValue) -> Result<(), RegistryError> {
        let param = self
            .params
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or(RegistryError::NotFound)?;

        Self::apply(param, value)
    }

    /// Set parameter by index
    pub fn set_by_index(&mut self, index: usize, value: ParamValue) -> Result<(), RegistryError> {
        let param = self.params.get_mut(index).ok_or(RegistryError::NotFound)?;

        Self::apply(param, value)
    }

    fn apply(param: &mut ParamMetadata, value: ParamValue) -> Result<(), RegistryError> {
        if !param.is_valid(value) {
            return Err(RegistryError::InvalidValue);
        }

        param.value = value;
        param.modified = param.value != param.default;
        Ok(())
    }

    /// Check if any parameters differ from their defaults
    pub fn has_modified(&self) -> bool {
        self.params.iter().any(|p| p.modified)
    }

    /// Iterate over all parameters in index order
    pub fn iter(&self) -> impl Iterator<Item = &ParamMetadata> {
        self.params.iter()
    }
}
