//! Core tracker functionality
//!
//! Logging, geographic locations and the runtime parameter registry.

pub mod location;
pub mod logging;
pub mod parameters;
