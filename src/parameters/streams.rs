//! Telemetry Stream Rate Parameters
//!
//! One rate parameter per stream group and channel, named like ArduPilot's
//! `SRn_*` parameters.
//!
//! # Parameters
//!
//! - `SRn_RAW_SENS`, `SRn_EXT_STAT`, `SRn_RC_CHAN`, `SRn_RAW_CTRL`,
//!   `SRn_POSITION`, `SRn_EXTRA1`, `SRn_EXTRA2`, `SRn_EXTRA3`, `SRn_PARAMS`
//! - Range 0-50 Hz, 0 disables the group
//! - Default 1 Hz, except `SRn_PARAMS` at 10 Hz

use crate::communication::mavlink::streams::{StreamId, STREAM_COUNT};
use crate::communication::mavlink::MAX_CHANNELS;
use crate::core::parameters::{ParamMetadata, ParameterRegistry, RegistryError};

/// Default group rate (Hz)
pub const DEFAULT_RATE_HZ: u16 = 1;

/// Default rate of the parameter stream (Hz)
pub const DEFAULT_PARAMS_RATE_HZ: u16 = 10;

/// Highest configurable rate (Hz)
pub const MAX_RATE_HZ: u16 = 50;

/// Parameter names indexed by channel, then by [`StreamId::index`]
static SR_PARAM_NAMES: [[&str; STREAM_COUNT]; MAX_CHANNELS] = [
    [
        "SR0_RAW_SENS", "SR0_EXT_STAT", "SR0_RC_CHAN", "SR0_RAW_CTRL", "SR0_POSITION",
        "SR0_EXTRA1", "SR0_EXTRA2", "SR0_EXTRA3", "SR0_PARAMS",
    ],
    [
        "SR1_RAW_SENS", "SR1_EXT_STAT", "SR1_RC_CHAN", "SR1_RAW_CTRL", "SR1_POSITION",
        "SR1_EXTRA1", "SR1_EXTRA2", "SR1_EXTRA3", "SR1_PARAMS",
    ],
    [
        "SR2_RAW_SENS", "SR2_EXT_STAT", "SR2_RC_CHAN", "SR2_RAW_CTRL", "SR2_POSITION",
        "SR2_EXTRA1", "SR2_EXTRA2", "SR2_EXTRA3", "SR2_PARAMS",
    ],
    [
        "SR3_RAW_SENS", "SR3_EXT_STAT", "SR3_RC_CHAN", "SR3_RAW_CTRL", "SR3_POSITION",
        "SR3_EXTRA1", "SR3_EXTRA2", "SR3_EXTRA3", "SR3_PARAMS",
    ],
];

/// Stream rates configured for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRateParams {
    rates: [u16; STREAM_COUNT],
}

impl Default for StreamRateParams {
    fn default() -> Self {
        let mut rates = [DEFAULT_RATE_HZ; STREAM_COUNT];
        rates[StreamId::Params.index()] = DEFAULT_PARAMS_RATE_HZ;
        Self { rates }
    }
}

impl StreamRateParams {
    /// Name of the rate parameter for `stream` on `channel`
    pub fn param_name(channel: usize, stream: StreamId) -> Option<&'static str> {
        SR_PARAM_NAMES
            .get(channel)
            .map(|names| names[stream.index()])
    }

    /// Register stream rate parameters for `channel` with default values
    pub fn register_defaults(
        registry: &mut ParameterRegistry,
        channel: usize,
    ) -> Result<(), RegistryError> {
        let names = SR_PARAM_NAMES.get(channel).ok_or(RegistryError::NotFound)?;
        let defaults = Self::default();

        for stream in StreamId::ALL {
            registry.register(ParamMetadata::new_uint32(
                names[stream.index()],
                defaults.rate_hz(stream) as u32,
                0,
                MAX_RATE_HZ as u32,
            ))?;
        }

        Ok(())
    }

    /// Load the rates for `channel`, falling back to defaults for missing entries
    pub fn from_registry(registry: &ParameterRegistry, channel: usize) -> Self {
        let mut params = Self::default();

        for stream in StreamId::ALL {
            if let Some(name) = Self::param_name(channel, stream) {
                let rate = registry.get_u32_or(name, params.rate_hz(stream) as u32);
                params.set_rate_hz(stream, rate.min(MAX_RATE_HZ as u32) as u16);
            }
        }

        params
    }

    /// Configured rate for `stream` (Hz)
    pub fn rate_hz(&self, stream: StreamId) -> u16 {
        self.rates[stream.index()]
    }

    /// Override the rate for `stream`, clamped to the allowed range
    pub fn set_rate_hz(&mut self, stream: StreamId, rate_hz: u16) {
        self.rates[stream.index()] = rate_hz.min(MAX_RATE_HZ);
    }
}
