#![cfg_attr(not(test), no_std)]

//! pico_tracker - MAVLink command and telemetry layer for an antenna tracker
//!
//! This library decodes operator and vehicle traffic, applies it to tracker state
//! under safety rules, and schedules the outbound telemetry streams a ground
//! station expects from an ArduPilot-compatible antenna tracker.

// Core infrastructure (logging, locations, parameter registry)
pub mod core;

// Parameter groups consumed by the protocol layer
pub mod parameters;

// Tracker state and collaborator interfaces
pub mod tracker;

// MAVLink protocol layer
pub mod communication;
