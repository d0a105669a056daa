//! MAVLink Telemetry Streaming
//!
//! Implements periodic telemetry streaming to Ground Control Stations, one
//! independent schedule per channel.
//!
//! # Tick Order
//!
//! 1. **HEARTBEAT**: 1Hz, independent of stream groups
//! 2. **STATUSTEXT**: pending notices, as many as the budget allows
//! 3. **Stream groups**: in [`STREAM_ENTRIES`] order, each at its `SRn_*` rate
//!
//! # Budget
//!
//! The caller passes the free transmit space of the channel. A member is only
//! queued if its full frame fits; the first member that does not fit ends its
//! group for this tick. Members the tracker cannot supply cost nothing. The
//! next parameter of a list is only taken once its frame is known to fit.

use super::param::ParamHandler;
use crate::communication::mavlink::status::heartbeat;
use crate::communication::mavlink::status_notifier::{StatusNotifier, STATUSTEXT_PAYLOAD_LEN};
use crate::communication::mavlink::streams::{MessageKind, StreamId, STREAM_COUNT, STREAM_ENTRIES};
use crate::communication::mavlink::{frame_len, MAX_CHANNELS, MAX_TELEMETRY};
use crate::parameters::{AltSource, PidMask, StreamRateParams, TrackerParams};
use crate::tracker::{ArmingControl, PidAxis, PidInfo, TelemetrySource, TrackerState};
use heapless::Vec;
use mavlink::ardupilotmega::{
    MavMessage, PidTuningAxis, GLOBAL_POSITION_INT_DATA, NAV_CONTROLLER_OUTPUT_DATA,
    PID_TUNING_DATA,
};
use mavlink::MavlinkVersion;

/// HEARTBEAT payload length (bytes)
const HEARTBEAT_PAYLOAD_LEN: usize = 9;

/// Rate of the HEARTBEAT stream (Hz)
const HEARTBEAT_RATE_HZ: u16 = 1;

/// Messages one member can expand to (PID_TUNING: pitch and yaw)
const MAX_MEMBER_MESSAGES: usize = 2;

/// Stream configuration for a single stream
#[derive(Debug, Clone, Copy)]
struct StreamConfig {
    /// Target rate in Hz (0 = disabled)
    rate_hz: u16,
    /// Last send timestamp in microseconds
    last_send_us: u64,
}

impl StreamConfig {
    /// Create new stream config with specified rate
    const fn new(rate_hz: u16) -> Self {
        Self {
            rate_hz,
            last_send_us: u64::MAX, // Sentinel value for "never sent"
        }
    }

    /// Check if it's time to send based on rate and elapsed time
    fn should_send(&self, current_time_us: u64) -> bool {
        if self.rate_hz == 0 {
            return false; // Disabled
        }

        // If never sent before (sentinel value), always send
        if self.last_send_us == u64::MAX {
            return true;
        }

        let interval_us = 1_000_000 / self.rate_hz as u64;
        current_time_us.saturating_sub(self.last_send_us) >= interval_us
    }

    /// Update last send timestamp
    fn mark_sent(&mut self, timestamp_us: u64) {
        self.last_send_us = timestamp_us;
    }
}

/// Schedule of one channel
#[derive(Debug, Clone, Copy)]
struct ChannelStreams {
    version: MavlinkVersion,
    heartbeat: StreamConfig,
    groups: [StreamConfig; STREAM_COUNT],
}

impl ChannelStreams {
    fn new(rates: &StreamRateParams) -> Self {
        let mut groups = [StreamConfig::new(0); STREAM_COUNT];
        for stream in StreamId::ALL {
            groups[stream.index()] = StreamConfig::new(rates.rate_hz(stream));
        }

        Self {
            version: MavlinkVersion::V2,
            heartbeat: StreamConfig::new(HEARTBEAT_RATE_HZ),
            groups,
        }
    }
}

/// Everything a tick reads or drains besides the schedule itself
pub struct StreamSources<'a, V: ?Sized> {
    pub state: &'a TrackerState,
    pub vehicle: &'a V,
    pub params: &'a TrackerParams,
    pub param_handler: &'a mut ParamHandler,
    pub notifier: &'a mut StatusNotifier,
}

/// Remaining transmit space of one channel during a tick
struct Budget {
    version: MavlinkVersion,
    remaining: usize,
}

impl Budget {
    /// Whether a payload of `payload_len` would fit
    fn fits(&self, payload_len: usize) -> bool {
        frame_len(self.version, payload_len) <= self.remaining
    }

    /// Reserve room for a payload of `payload_len`, if it fits
    fn take(&mut self, payload_len: usize) -> bool {
        if !self.fits(payload_len) {
            return false;
        }
        self.remaining -= frame_len(self.version, payload_len);
        true
    }
}

/// Telemetry streamer for periodic message transmission
///
/// Manages per-channel stream rates and generates due telemetry messages.
#[derive(Debug)]
pub struct TelemetryStreamer {
    channels: [ChannelStreams; MAX_CHANNELS],
}

impl Default for TelemetryStreamer {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStreamer {
    /// Create a streamer with default rates on every channel
    pub fn new() -> Self {
        Self {
            channels: [ChannelStreams::new(&StreamRateParams::default()); MAX_CHANNELS],
        }
    }

    /// Apply all configured rates for `channel`
    ///
    /// Changed rates take effect on the next tick without resetting the
    /// last-sent timestamps.
    pub fn set_rates(&mut self, channel: usize, rates: &StreamRateParams) {
        if let Some(ch) = self.channels.get_mut(channel) {
            for stream in StreamId::ALL {
                ch.groups[stream.index()].rate_hz = rates.rate_hz(stream);
            }
        }
    }

    /// Configured rate of `stream` on `channel` (Hz)
    pub fn rate_hz(&self, channel: usize, stream: StreamId) -> Option<u16> {
        self.channels
            .get(channel)
            .map(|ch| ch.groups[stream.index()].rate_hz)
    }

    /// Set the MAVLink protocol version used on `channel`
    pub fn set_protocol_version(&mut self, channel: usize, version: MavlinkVersion) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.version = version;
        }
    }

    /// MAVLink protocol version used on `channel`
    pub fn protocol_version(&self, channel: usize) -> Option<MavlinkVersion> {
        self.channels.get(channel).map(|ch| ch.version)
    }

    /// Whether `stream` is due on `channel` at `current_time_us`
    pub fn is_due(&self, channel: usize, stream: StreamId, current_time_us: u64) -> bool {
        self.channels
            .get(channel)
            .is_some_and(|ch| ch.groups[stream.index()].should_send(current_time_us))
    }

    /// Generate the telemetry due on `channel`
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel being ticked
    /// * `txspace` - Free transmit space of the channel in bytes
    /// * `current_time_us` - Current timestamp in microseconds
    /// * `sources` - Tracker state and message sources
    pub fn update<V: TelemetrySource + ArmingControl + ?Sized>(
        &mut self,
        channel: usize,
        txspace: usize,
        current_time_us: u64,
        sources: &mut StreamSources<'_, V>,
    ) -> Vec<MavMessage, MAX_TELEMETRY> {
        let mut messages = Vec::new();
        let Some(ch) = self.channels.get_mut(channel) else {
            return messages;
        };

        let mut budget = Budget {
            version: ch.version,
            remaining: txspace,
        };
        let time_boot_ms = (current_time_us / 1000) as u32;

        if ch.heartbeat.should_send(current_time_us) && budget.take(HEARTBEAT_PAYLOAD_LEN) {
            ch.heartbeat.mark_sent(current_time_us);
            let _ = messages.push(heartbeat(
                sources.state.mode(),
                sources.vehicle.safety_state(),
                sources.vehicle.soft_armed(),
            ));
        }

        let room = budget.remaining / frame_len(budget.version, STATUSTEXT_PAYLOAD_LEN);
        for chunk in sources.notifier.take_up_to(room) {
            budget.take(STATUSTEXT_PAYLOAD_LEN);
            let _ = messages.push(MavMessage::STATUSTEXT(chunk));
        }

        for entry in STREAM_ENTRIES.iter() {
            let group = &mut ch.groups[entry.stream.index()];
            if !group.should_send(current_time_us) {
                continue;
            }
            group.mark_sent(current_time_us);

            'members: for kind in entry.members {
                if kind.mavlink1_only() && budget.version != MavlinkVersion::V1 {
                    continue;
                }

                if messages.capacity() - messages.len() < MAX_MEMBER_MESSAGES {
                    crate::log_warn!("Telemetry buffer full on channel {}", channel);
                    return messages;
                }
                // A built parameter is gone from the list, so check room first
                if kind.advances_cursor() && !budget.fits(kind.max_payload_len()) {
                    break 'members;
                }

                for msg in build_member(*kind, channel, time_boot_ms, sources) {
                    if !budget.take(kind.max_payload_len()) {
                        break 'members;
                    }
                    let _ = messages.push(msg);
                }
            }
        }

        messages
    }
}

/// Build the messages for one group member
///
/// Returns an empty list when the member has nothing to send.
fn build_member<V: TelemetrySource + ?Sized>(
    kind: MessageKind,
    channel: usize,
    time_boot_ms: u32,
    sources: &mut StreamSources<'_, V>,
) -> Vec<MavMessage, MAX_MEMBER_MESSAGES> {
    let mut out = Vec::new();

    match kind {
        MessageKind::NavControllerOutput => {
            let _ = out.push(nav_controller_output(sources.vehicle, sources.params.alt_source));
        }
        MessageKind::PidTuning => {
            for (flag, axis) in [(PidMask::PITCH, PidAxis::Pitch), (PidMask::YAW, PidAxis::Yaw)] {
                if !sources.params.gcs_pid_mask.contains(flag) {
                    continue;
                }
                if let Some(info) = sources.vehicle.pid_info(axis) {
                    let _ = out.push(pid_tuning(axis, &info));
                }
            }
        }
        MessageKind::Location if sources.vehicle.is_stationary() => {
            let _ = out.push(stationary_position(sources.vehicle, time_boot_ms));
        }
        MessageKind::NextParam => {
            if let Some(msg) = sources.param_handler.next_param(channel) {
                let _ = out.push(msg);
            }
        }
        _ => {
            if let Some(msg) = sources.vehicle.build_message(kind, time_boot_ms) {
                let _ = out.push(msg);
            }
        }
    }

    out
}

/// NAV_CONTROLLER_OUTPUT toward the tracked vehicle
pub fn nav_controller_output<V: TelemetrySource + ?Sized>(
    vehicle: &V,
    alt_source: AltSource,
) -> MavMessage {
    let nav = vehicle.nav_status();
    let alt_error = match alt_source {
        AltSource::Baro => nav.alt_difference_baro,
        AltSource::Gps => nav.alt_difference_gps,
    };

    MavMessage::NAV_CONTROLLER_OUTPUT(NAV_CONTROLLER_OUTPUT_DATA {
        nav_roll: 0.0,
        nav_pitch: nav.pitch,
        alt_error,
        aspd_error: 0.0,
        xtrack_error: 0.0,
        nav_bearing: nav.bearing as i16,
        target_bearing: nav.bearing as i16,
        wp_dist: nav.distance.min(u16::MAX as f32) as u16,
    })
}

/// PID_TUNING for one axis
pub fn pid_tuning(axis: PidAxis, info: &PidInfo) -> MavMessage {
    let axis = match axis {
        PidAxis::Pitch => PidTuningAxis::PID_TUNING_PITCH,
        PidAxis::Yaw => PidTuningAxis::PID_TUNING_YAW,
    };

    MavMessage::PID_TUNING(PID_TUNING_DATA {
        desired: info.target,
        achieved: info.actual,
        FF: info.ff,
        P: info.p,
        I: info.i,
        D: info.d,
        axis,
        SRate: info.slew_rate,
        PDmod: info.d_mod,
    })
}

/// GLOBAL_POSITION_INT of a tracker fixed in place
pub fn stationary_position<V: TelemetrySource + ?Sized>(
    vehicle: &V,
    time_boot_ms: u32,
) -> MavMessage {
    let location = vehicle.current_location();

    MavMessage::GLOBAL_POSITION_INT(GLOBAL_POSITION_INT_DATA {
        time_boot_ms,
        lat: location.lat,
        lon: location.lng,
        alt: location.alt.saturating_mul(10), // cm -> mm
        relative_alt: 0,
        vx: 0,
        vy: 0,
        vz: 0,
        hdg: vehicle.yaw_centidegrees(),
    })
}
