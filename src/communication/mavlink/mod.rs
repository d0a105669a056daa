//! MAVLink Protocol Communication
//!
//! Tracker side of the MAVLink protocol, sitting between decoded messages and
//! the tracker state.
//!
//! # Architecture
//!
//! - **Router**: Dispatch by message kind, then common handling
//! - **Handlers**: Target lock, commands, home upload, parameters, telemetry
//! - **Streams**: Static stream group registry
//! - **Status**: HEARTBEAT field encoding
//! - **Status notifier**: STATUSTEXT queue
//!
//! # Usage
//!
//! ```ignore
//! use pico_tracker::communication::mavlink::{Destination, MavlinkRouter, RawFrame};
//!
//! let mut router = MavlinkRouter::new(MavlinkConfig::default())?;
//! let mut state = TrackerState::new();
//!
//! // Inbound: a CRC-checked frame from the transport
//! let frame = RawFrame::from(&raw);
//! if let Ok(replies) = router.handle_frame(chan, &frame, now_us, &mut state, &mut tracker) {
//!     for reply in replies {
//!         match reply.destination {
//!             Destination::Channel(c) => transport.send(c, &reply.message),
//!             Destination::AllChannels => transport.broadcast(&reply.message),
//!         }
//!     }
//! }
//!
//! // Outbound: once per loop iteration and channel
//! for msg in router.update_telemetry(chan, txspace, now_us, &state, &tracker) {
//!     transport.send(chan, &msg);
//! }
//! ```

pub mod handlers; // Message handlers
pub mod router; // Protocol message routing
pub mod status; // HEARTBEAT field encoding
pub mod status_notifier; // STATUSTEXT notification queue
pub mod streams; // Stream group registry

pub use router::{MavlinkRouter, RouterError, RouterStats};

use mavlink::ardupilotmega::MavMessage;
use mavlink::{MAVLinkV1MessageRaw, MAVLinkV2MessageRaw, MavHeader, MavlinkVersion};

/// Number of MAVLink channels (links) the tracker serves
pub const MAX_CHANNELS: usize = 4;

/// Maximum replies produced by a single inbound message
pub const MAX_RESPONSES: usize = 16;

/// Maximum messages produced by one telemetry tick on one channel
pub const MAX_TELEMETRY: usize = 48;

/// MAVLink 2 framing bytes around a payload (header + CRC, unsigned)
const MAVLINK2_OVERHEAD: usize = 12;

/// MAVLink 1 framing bytes around a payload
const MAVLINK1_OVERHEAD: usize = 8;

/// MAVLink configuration
#[derive(Debug, Clone, Copy)]
pub struct MavlinkConfig {
    /// System ID (MAVLink system ID for this tracker)
    pub system_id: u8,
    /// Component ID
    pub component_id: u8,
    /// Number of active channels (1..=MAX_CHANNELS)
    pub channels: usize,
}

impl Default for MavlinkConfig {
    fn default() -> Self {
        Self {
            system_id: env!("MAVLINK_SYSTEM_ID").parse().unwrap_or(1),
            component_id: env!("MAVLINK_COMPONENT_ID").parse().unwrap_or(1),
            channels: 1,
        }
    }
}

/// Bytes needed on the wire for a payload of `payload_len`
pub const fn frame_len(version: MavlinkVersion, payload_len: usize) -> usize {
    match version {
        MavlinkVersion::V1 => payload_len + MAVLINK1_OVERHEAD,
        MavlinkVersion::V2 => payload_len + MAVLINK2_OVERHEAD,
    }
}

/// Inbound frame with its payload still encoded
///
/// Some fields lose bits when decoded (SET_ATTITUDE_TARGET type_mask), so the
/// router reads those from the payload.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    pub header: MavHeader,
    pub version: MavlinkVersion,
    pub message_id: u32,
    pub payload: &'a [u8],
}

impl<'a> From<&'a MAVLinkV2MessageRaw> for RawFrame<'a> {
    fn from(raw: &'a MAVLinkV2MessageRaw) -> Self {
        Self {
            header: MavHeader {
                system_id: raw.system_id(),
                component_id: raw.component_id(),
                sequence: raw.sequence(),
            },
            version: MavlinkVersion::V2,
            message_id: raw.message_id(),
            payload: raw.payload(),
        }
    }
}

impl<'a> From<&'a MAVLinkV1MessageRaw> for RawFrame<'a> {
    fn from(raw: &'a MAVLinkV1MessageRaw) -> Self {
        Self {
            header: MavHeader {
                system_id: raw.system_id(),
                component_id: raw.component_id(),
                sequence: raw.sequence(),
            },
            version: MavlinkVersion::V1,
            message_id: raw.message_id() as u32,
            payload: raw.payload(),
        }
    }
}

/// Where an outbound message should be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A single channel (usually the one the request arrived on)
    Channel(usize),
    /// Every active channel
    AllChannels,
}

/// Outbound message with its destination
#[derive(Debug, Clone)]
pub struct Outbound {
    pub destination: Destination,
    pub message: MavMessage,
}

impl Outbound {
    /// Reply on `channel`
    pub fn to_channel(channel: usize, message: MavMessage) -> Self {
        Self {
            destination: Destination::Channel(channel),
            message,
        }
    }

    /// Send on every channel
    pub fn broadcast(message: MavMessage) -> Self {
        Self {
            destination: Destination::AllChannels,
            message,
        }
    }
}

/// Replies produced by one inbound message
pub type Responses = heapless::Vec<Outbound, MAX_RESPONSES>;

/// Queue `outbound`, dropping it with a warning if the reply buffer is full
pub(crate) fn push_response(responses: &mut Responses, outbound: Outbound) {
    if responses.push(outbound).is_err() {
        crate::log_warn!("Reply buffer full, dropping message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len() {
        assert_eq!(frame_len(MavlinkVersion::V2, 9), 21);
        assert_eq!(frame_len(MavlinkVersion::V1, 9), 17);
    }

    #[test]
    fn test_default_config() {
        let config = MavlinkConfig::default();
        assert!(config.system_id >= 1);
        assert_eq!(config.channels, 1);
    }
}
