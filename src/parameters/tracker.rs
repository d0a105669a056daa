//! Tracker Protocol Parameter Definitions
//!
//! # Parameters
//!
//! - `SYSID_TARGET` - MAVLink system ID of the vehicle to track (0 = first seen)
//! - `SYSID_MYGCS` - MAVLink system ID of the ground station (default 255)
//! - `GCS_PID_MASK` - PID_TUNING reporting mask (bit 0 pitch, bit 1 yaw)
//! - `MAV_UPDATE_RATE` - Stream rate requested from the target vehicle (Hz)
//! - `ALT_SOURCE` - Altitude difference source for NAV_CONTROLLER_OUTPUT
//!   (0 = barometer, 1 = GPS)

use crate::core::parameters::{ParamMetadata, ParameterRegistry, RegistryError};
use bitflags::bitflags;

/// Default ground station system ID
const DEFAULT_MYGCS: u8 = 255;

/// Default stream rate requested from the target (Hz)
const DEFAULT_UPDATE_RATE: u16 = 1;

bitflags! {
    /// Axes reported in PID_TUNING
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PidMask: u8 {
        /// Pitch controller
        const PITCH = 1 << 0;
        /// Yaw controller
        const YAW = 1 << 1;
    }
}

/// Source of the altitude difference between tracker and vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AltSource {
    /// Barometric altitude difference
    #[default]
    Baro,
    /// GPS altitude difference
    Gps,
}

impl From<u32> for AltSource {
    fn from(value: u32) -> Self {
        match value {
            1 => AltSource::Gps,
            _ => AltSource::Baro,
        }
    }
}

/// Tracker protocol parameters loaded from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerParams {
    /// Target vehicle filter (0 = not configured)
    pub sysid_target: u8,
    /// Ground station system ID
    pub sysid_mygcs: u8,
    /// PID_TUNING axes
    pub gcs_pid_mask: PidMask,
    /// Stream rate requested from the target vehicle (Hz)
    pub mav_update_rate: u16,
    /// Altitude difference source
    pub alt_source: AltSource,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            sysid_target: 0,
            sysid_mygcs: DEFAULT_MYGCS,
            gcs_pid_mask: PidMask::empty(),
            mav_update_rate: DEFAULT_UPDATE_RATE,
            alt_source: AltSource::Baro,
        }
    }
}

impl TrackerParams {
    /// Register tracker parameters with default values
    pub fn register_defaults(registry: &mut ParameterRegistry) -> Result<(), RegistryError> {
        registry.register(ParamMetadata::new_uint32("SYSID_TARGET", 0, 0, 255))?;
        registry.register(ParamMetadata::new_uint32(
            "SYSID_MYGCS",
            DEFAULT_MYGCS as u32,
            1,
            255,
        ))?;
        registry.register(ParamMetadata::new_uint32("GCS_PID_MASK", 0, 0, 3))?;
        registry.register(ParamMetadata::new_uint32(
            "MAV_UPDATE_RATE",
            DEFAULT_UPDATE_RATE as u32,
            1,
            50,
        ))?;
        registry.register(ParamMetadata::new_uint32("ALT_SOURCE", 0, 0, 1))?;

        Ok(())
    }

    /// Load tracker parameters from the registry
    pub fn from_registry(registry: &ParameterRegistry) -> Self {
        let defaults = Self::default();

        Self {
            sysid_target: registry.get_u32_or("SYSID_TARGET", 0).min(255) as u8,
            sysid_mygcs: registry
                .get_u32_or("SYSID_MYGCS", defaults.sysid_mygcs as u32)
                .min(255) as u8,
            gcs_pid_mask: PidMask::from_bits_truncate(
                registry.get_u32_or("GCS_PID_MASK", 0).min(255) as u8,
            ),
            mav_update_rate: registry
                .get_u32_or("MAV_UPDATE_RATE", defaults.mav_update_rate as u32)
                .min(50) as u16,
            alt_source: AltSource::from(registry.get_u32_or("ALT_SOURCE", 0)),
        }
    }
}
