//! Tracker parameter groups
//!
//! Each group registers its parameters with default values and ranges in the
//! [`ParameterRegistry`](crate::core::parameters::ParameterRegistry), and reads
//! a typed snapshot back with `from_registry`.
//!
//! - [`StreamRateParams`]: `SR{n}_*` telemetry stream rates per channel
//! - [`TrackerParams`]: target filter, ground station id, PID reporting mask

pub mod streams;
pub mod tracker;

pub use streams::StreamRateParams;
pub use tracker::{AltSource, PidMask, TrackerParams};
