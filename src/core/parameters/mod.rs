//! Parameter management system
//!
//! Runtime parameters are held in RAM with type and range metadata. Persistence
//! belongs to the host firmware.

pub mod registry;

pub use registry::{ParamMetadata, ParamType, ParamValue, ParameterRegistry, RegistryError};
