//! MAVLink Message Router
//!
//! Routes incoming MAVLink messages to the tracker handlers, then to the
//! common handler that every message reaches.
//!
//! # Architecture
//!
//! - Receives CRC-checked frames ([`RawFrame`]) or already decoded messages,
//!   with their channel
//! - Tracker path: target lock, position/pressure forwarding, attitude
//!   setpoints, home upload, manual control
//! - Common path: GCS link tracking, parameters, commands, stream rate requests
//! - Returns replies to the caller instead of writing to a transport
//!
//! # Target Filter
//!
//! When `SYSID_TARGET` is set, heartbeats, positions and pressure reports from
//! other systems skip the tracker path. They still reach the common path.
//!
//! # Connection Tracking
//!
//! - Monitors HEARTBEAT messages from `SYSID_MYGCS`, per channel
//! - Tracks last received heartbeat timestamp
//! - Provides connection status queries

use super::handlers::command::attitude_type_mask;
use super::handlers::{
    target, CommandHandler, MissionHandler, ParamHandler, StreamSources, TelemetryStreamer,
};
use super::status_notifier::{StatusNotifier, MAX_PENDING_CHUNKS};
use super::streams::{StreamId, STREAM_COUNT};
use super::{
    push_response, MavlinkConfig, Outbound, RawFrame, Responses, MAX_CHANNELS, MAX_TELEMETRY,
};
use crate::core::parameters::{ParamValue, ParameterRegistry, RegistryError};
use crate::parameters::{StreamRateParams, TrackerParams};
use crate::tracker::{ArmingControl, TelemetrySource, Tracker, TrackerState};
use heapless::Vec;
use mavlink::ardupilotmega::{MavDataStream, MavMessage, REQUEST_DATA_STREAM_DATA};
use mavlink::{MavHeader, MavlinkVersion, Message};

/// Default GCS link timeout (microseconds)
pub const GCS_TIMEOUT_US: u64 = 5_000_000;

/// Connection state with Ground Control Station
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionState {
    /// GCS is connected (received heartbeat within timeout)
    pub connected: bool,
    /// Last heartbeat timestamp (microseconds since boot)
    pub last_heartbeat_us: u64,
    /// Number of heartbeats received
    pub heartbeat_count: u32,
}

impl ConnectionState {
    /// Check if connection is active
    ///
    /// Connection is considered active if a heartbeat was received within
    /// `timeout_us` (see [`GCS_TIMEOUT_US`]).
    pub fn is_active(&self, current_time_us: u64, timeout_us: u64) -> bool {
        self.connected && current_time_us.saturating_sub(self.last_heartbeat_us) < timeout_us
    }

    /// Update connection state on heartbeat reception
    pub fn update_heartbeat(&mut self, timestamp_us: u64) {
        self.connected = true;
        self.last_heartbeat_us = timestamp_us;
        self.heartbeat_count = self.heartbeat_count.wrapping_add(1);
    }
}

/// Router statistics for monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterStats {
    /// Total messages processed
    pub messages_processed: u32,
    /// Messages that skipped the tracker path because of `SYSID_TARGET`
    pub filtered_messages: u32,
    /// Messages handled by the common path only
    pub common_only_messages: u32,
    /// Unhandled messages (no handler registered)
    pub unhandled_messages: u32,
    /// Handler errors
    pub handler_errors: u32,
    /// Frames whose payload did not decode
    pub decode_errors: u32,
}

/// Router error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RouterError {
    /// No handler registered for message type
    NoHandler,
    /// Handler execution failed
    HandlerFailed,
    /// Message arrived on a channel that is not configured
    InvalidChannel,
    /// Frame payload could not be decoded
    DecodeFailed,
}

impl core::fmt::Display for RouterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RouterError::NoHandler => write!(f, "No handler registered for message type"),
            RouterError::HandlerFailed => write!(f, "Handler execution failed"),
            RouterError::InvalidChannel => write!(f, "Channel not configured"),
            RouterError::DecodeFailed => write!(f, "Frame payload could not be decoded"),
        }
    }
}

/// MAVLink message router
///
/// Owns the parameter registry, the per-channel telemetry schedule and the
/// STATUSTEXT queue. Tracker state and the host collaborators are passed in
/// on every call.
pub struct MavlinkRouter {
    /// Link identity and channel count
    config: MavlinkConfig,
    /// Connection state with GCS, per channel
    connections: [ConnectionState; MAX_CHANNELS],
    /// Router statistics
    stats: RouterStats,
    /// Tracker parameters, reloaded after every change
    params: TrackerParams,
    /// Parameter protocol handler
    param_handler: ParamHandler,
    /// Telemetry streamer
    telemetry: TelemetryStreamer,
    /// Command handler
    command_handler: CommandHandler,
    /// Mission handler
    mission_handler: MissionHandler,
    /// Operator notices
    notifier: StatusNotifier,
}

impl MavlinkRouter {
    /// Create a new router with default parameters
    ///
    /// Registers the tracker parameters and one set of `SRn_*` stream rates
    /// per configured channel.
    pub fn new(config: MavlinkConfig) -> Result<Self, RegistryError> {
        let channels = config.channels.clamp(1, MAX_CHANNELS);
        let config = MavlinkConfig { channels, ..config };

        let mut registry = ParameterRegistry::new();
        TrackerParams::register_defaults(&mut registry)?;
        for channel in 0..channels {
            StreamRateParams::register_defaults(&mut registry, channel)?;
        }

        crate::log_info!(
            "MAVLink router: sysid={} compid={} channels={} params={}",
            config.system_id,
            config.component_id,
            channels,
            registry.count()
        );

        let mut router = Self {
            config,
            connections: [ConnectionState::default(); MAX_CHANNELS],
            stats: RouterStats::default(),
            params: TrackerParams::from_registry(&registry),
            param_handler: ParamHandler::new(registry),
            telemetry: TelemetryStreamer::new(),
            command_handler: CommandHandler::new(),
            mission_handler: MissionHandler::new(),
            notifier: StatusNotifier::new(),
        };
        router.reload_params();
        Ok(router)
    }

    /// Link configuration
    pub fn config(&self) -> &MavlinkConfig {
        &self.config
    }

    /// Get connection state of `channel`
    pub fn connection(&self, channel: usize) -> Option<&ConnectionState> {
        self.connections[..self.config.channels].get(channel)
    }

    /// Get router statistics
    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    /// Reset router statistics
    pub fn reset_stats(&mut self) {
        self.stats = RouterStats::default();
    }

    /// Current tracker parameters
    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Get reference to parameter handler
    pub fn param_handler(&self) -> &ParamHandler {
        &self.param_handler
    }

    /// Operator notice queue
    pub fn notifier_mut(&mut self) -> &mut StatusNotifier {
        &mut self.notifier
    }

    /// Get reference to the telemetry streamer
    pub fn telemetry(&self) -> &TelemetryStreamer {
        &self.telemetry
    }

    /// Set the MAVLink protocol version detected on `channel`
    pub fn set_protocol_version(&mut self, channel: usize, version: MavlinkVersion) {
        self.telemetry.set_protocol_version(channel, version);
    }

    /// Set a parameter outside the MAVLink protocol (e.g. from storage)
    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), RegistryError> {
        self.param_handler.registry_mut().set_by_name(name, value)?;
        self.reload_params();
        Ok(())
    }

    /// Drain queued operator notices as STATUSTEXT messages
    pub fn take_status_messages(&mut self) -> Vec<MavMessage, MAX_PENDING_CHUNKS> {
        self.notifier
            .take_pending()
            .into_iter()
            .map(MavMessage::STATUSTEXT)
            .collect()
    }

    /// Update telemetry on `channel` and get messages to send
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel to tick
    /// * `txspace` - Free transmit space on the channel (bytes)
    /// * `current_time_us` - Current timestamp in microseconds
    /// * `state` - Tracker state
    /// * `vehicle` - Telemetry sources
    pub fn update_telemetry<V: TelemetrySource + ArmingControl + ?Sized>(
        &mut self,
        channel: usize,
        txspace: usize,
        current_time_us: u64,
        state: &TrackerState,
        vehicle: &V,
    ) -> Vec<MavMessage, MAX_TELEMETRY> {
        if channel >= self.config.channels {
            return Vec::new();
        }

        let mut sources = StreamSources {
            state,
            vehicle,
            params: &self.params,
            param_handler: &mut self.param_handler,
            notifier: &mut self.notifier,
        };
        self.telemetry
            .update(channel, txspace, current_time_us, &mut sources)
    }

    /// Handle incoming MAVLink message
    ///
    /// Routes the message to the tracker handler for its kind, then to the
    /// common handler. Pending STATUSTEXT notices are appended to the replies
    /// and the tracker snapshot is republished.
    ///
    /// A decoded SET_ATTITUDE_TARGET has lost the legacy type_mask bits; use
    /// [`Self::handle_frame`] for traffic straight off the wire.
    ///
    /// # Returns
    ///
    /// Replies to send, or `Err` if:
    /// - No handler registered for message type
    /// - Handler returned an error
    /// - `channel` is not configured
    ///
    /// # Examples
    ///
    /// ```ignore
    /// match router.handle_message(0, &header, &message, now_us, &mut state, &mut tracker) {
    ///     Ok(replies) => transport.send_all(&replies),
    ///     Err(e) => defmt::debug!("Message not handled: {}", e),
    /// }
    /// ```
    pub fn handle_message<V: Tracker>(
        &mut self,
        channel: usize,
        header: &MavHeader,
        message: &MavMessage,
        timestamp_us: u64,
        state: &mut TrackerState,
        vehicle: &mut V,
    ) -> Result<Responses, RouterError> {
        self.route(channel, header, message, None, timestamp_us, state, vehicle)
    }

    /// Decode and handle a frame received on `channel`
    ///
    /// Same as [`Self::handle_message`], except that fields the decoder
    /// truncates are read from the raw payload.
    ///
    /// # Returns
    ///
    /// Replies to send, or `Err(RouterError::DecodeFailed)` if the payload is
    /// not a valid message of the dialect.
    pub fn handle_frame<V: Tracker>(
        &mut self,
        channel: usize,
        frame: &RawFrame<'_>,
        timestamp_us: u64,
        state: &mut TrackerState,
        vehicle: &mut V,
    ) -> Result<Responses, RouterError> {
        if channel >= self.config.channels {
            crate::log_warn!("Frame on unconfigured channel {}", channel);
            return Err(RouterError::InvalidChannel);
        }

        let message = match MavMessage::parse(frame.version, frame.message_id, frame.payload) {
            Ok(message) => message,
            Err(_) => {
                crate::log_debug!("Undecodable frame, message id {}", frame.message_id);
                self.stats.decode_errors = self.stats.decode_errors.wrapping_add(1);
                return Err(RouterError::DecodeFailed);
            }
        };

        self.route(
            channel,
            &frame.header,
            &message,
            Some(frame.payload),
            timestamp_us,
            state,
            vehicle,
        )
    }

    /// Shared body of [`Self::handle_message`] and [`Self::handle_frame`]
    #[allow(clippy::too_many_arguments)]
    fn route<V: Tracker>(
        &mut self,
        channel: usize,
        header: &MavHeader,
        message: &MavMessage,
        payload: Option<&[u8]>,
        timestamp_us: u64,
        state: &mut TrackerState,
        vehicle: &mut V,
    ) -> Result<Responses, RouterError> {
        if channel >= self.config.channels {
            crate::log_warn!("Message on unconfigured channel {}", channel);
            return Err(RouterError::InvalidChannel);
        }

        self.stats.messages_processed = self.stats.messages_processed.wrapping_add(1);
        let mut responses = Responses::new();

        let tracker_handled = self.handle_tracker_message(
            channel,
            header,
            message,
            payload,
            state,
            vehicle,
            &mut responses,
        );
        let common = self.handle_common(
            channel,
            header,
            message,
            timestamp_us,
            state,
            vehicle,
            &mut responses,
        );

        state.publish();

        match common {
            Err(e) => {
                self.stats.handler_errors = self.stats.handler_errors.wrapping_add(1);
                Err(e)
            }
            Ok(false) if !tracker_handled => {
                self.stats.unhandled_messages = self.stats.unhandled_messages.wrapping_add(1);
                Err(RouterError::NoHandler)
            }
            Ok(common_handled) => {
                if common_handled && !tracker_handled {
                    self.stats.common_only_messages =
                        self.stats.common_only_messages.wrapping_add(1);
                }
                for chunk in self.notifier.take_pending() {
                    push_response(
                        &mut responses,
                        Outbound::broadcast(MavMessage::STATUSTEXT(chunk)),
                    );
                }
                Ok(responses)
            }
        }
    }

    /// Whether a message from `sysid` may reach the target-telemetry paths
    fn from_target(&self, sysid: u8) -> bool {
        self.params.sysid_target == 0 || self.params.sysid_target == sysid
    }

    /// Tracker-specific handling
    ///
    /// Returns `true` if the message kind belongs to the tracker path, even if
    /// it was filtered or rejected.
    #[allow(clippy::too_many_arguments)]
    fn handle_tracker_message<V: Tracker>(
        &mut self,
        channel: usize,
        header: &MavHeader,
        message: &MavMessage,
        payload: Option<&[u8]>,
        state: &mut TrackerState,
        vehicle: &mut V,
        responses: &mut Responses,
    ) -> bool {
        match message {
            MavMessage::HEARTBEAT(data) => {
                if !self.from_target(header.system_id) {
                    self.count_filtered();
                    return true;
                }
                if target::handle_heartbeat(
                    state,
                    self.param_handler.registry_mut(),
                    header,
                    data,
                    self.params.mav_update_rate,
                    responses,
                ) {
                    self.reload_params();
                }
                true
            }
            MavMessage::GLOBAL_POSITION_INT(data) => {
                if self.from_target(header.system_id) {
                    vehicle.update_position(header.system_id, data);
                } else {
                    self.count_filtered();
                }
                true
            }
            MavMessage::SCALED_PRESSURE(data) => {
                if self.from_target(header.system_id) {
                    vehicle.update_pressure(header.system_id, data);
                } else {
                    self.count_filtered();
                }
                true
            }
            MavMessage::SET_ATTITUDE_TARGET(data) => {
                let type_mask = payload.map_or(data.type_mask.bits(), attitude_type_mask);
                self.command_handler
                    .handle_set_attitude_target(state, vehicle, data, type_mask);
                true
            }
            MavMessage::MISSION_WRITE_PARTIAL_LIST(data) => {
                if let Some(request) =
                    self.mission_handler
                        .handle_write_partial_list(state, header, data)
                {
                    push_response(responses, Outbound::to_channel(channel, request));
                }
                true
            }
            MavMessage::MISSION_ITEM(data) => {
                let ack = self.mission_handler.handle_mission_item(
                    state,
                    vehicle,
                    &mut self.notifier,
                    header,
                    data,
                );
                push_response(responses, Outbound::to_channel(channel, ack));
                true
            }
            MavMessage::MANUAL_CONTROL(data) => {
                vehicle.manual_control(data);
                true
            }
            _ => false,
        }
    }

    /// Handling shared by every message
    ///
    /// Returns `Ok(true)` if the message kind has a common handler.
    #[allow(clippy::too_many_arguments)]
    fn handle_common<V: Tracker>(
        &mut self,
        channel: usize,
        header: &MavHeader,
        message: &MavMessage,
        timestamp_us: u64,
        state: &mut TrackerState,
        vehicle: &mut V,
        responses: &mut Responses,
    ) -> Result<bool, RouterError> {
        match message {
            MavMessage::HEARTBEAT(_) => {
                if header.system_id == self.params.sysid_mygcs {
                    self.connections[channel].update_heartbeat(timestamp_us);
                }
                Ok(true)
            }
            MavMessage::PARAM_REQUEST_LIST(_) => {
                self.param_handler.handle_request_list(channel);
                Ok(true)
            }
            MavMessage::PARAM_REQUEST_READ(data) => {
                match self.param_handler.handle_request_read(data) {
                    Some(reply) => push_response(responses, Outbound::to_channel(channel, reply)),
                    None => crate::log_debug!("PARAM_REQUEST_READ for unknown parameter"),
                }
                Ok(true)
            }
            MavMessage::PARAM_SET(data) => match self.param_handler.handle_set(data) {
                Ok((_name, reply)) => {
                    self.reload_params();
                    push_response(responses, Outbound::broadcast(reply));
                    Ok(true)
                }
                Err(e) => {
                    crate::log_warn!("PARAM_SET rejected: {}", e);
                    Err(RouterError::HandlerFailed)
                }
            },
            MavMessage::COMMAND_LONG(data) => {
                let ack = self
                    .command_handler
                    .handle_command_long(state, vehicle, header, data);
                push_response(responses, Outbound::to_channel(channel, ack));
                Ok(true)
            }
            MavMessage::COMMAND_INT(data) => {
                let ack = self
                    .command_handler
                    .handle_command_int(state, vehicle, header, data);
                push_response(responses, Outbound::to_channel(channel, ack));
                Ok(true)
            }
            MavMessage::REQUEST_DATA_STREAM(data) => {
                self.handle_request_data_stream(channel, data);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Handle REQUEST_DATA_STREAM for the receiving channel
    ///
    /// The rate is written to the channel's `SRn_*` parameter so it shows up
    /// in parameter reads.
    fn handle_request_data_stream(&mut self, channel: usize, data: &REQUEST_DATA_STREAM_DATA) {
        let rate = if data.start_stop == 0 {
            0
        } else {
            data.req_message_rate as u32
        };

        let mut streams: Vec<StreamId, STREAM_COUNT> = Vec::new();
        if data.req_stream_id == MavDataStream::MAV_DATA_STREAM_ALL as u8 {
            // ALL never changes the parameter stream
            for stream in StreamId::ALL.iter().filter(|s| **s != StreamId::Params) {
                let _ = streams.push(*stream);
            }
        } else if let Some(stream) = stream_for_request(data.req_stream_id) {
            let _ = streams.push(stream);
        } else {
            crate::log_debug!("Unknown data stream {} requested", data.req_stream_id);
            return;
        }

        let registry = self.param_handler.registry_mut();
        for stream in streams {
            let Some(name) = StreamRateParams::param_name(channel, stream) else {
                continue;
            };
            let clamped = rate.min(crate::parameters::streams::MAX_RATE_HZ as u32);
            if let Err(e) = registry.set_by_name(name, ParamValue::Uint32(clamped)) {
                crate::log_warn!("Failed to set {}: {}", name, e);
            }
        }

        let rates = StreamRateParams::from_registry(self.param_handler.registry(), channel);
        self.telemetry.set_rates(channel, &rates);
    }

    /// Reload parameter-derived settings after a change
    fn reload_params(&mut self) {
        let registry = self.param_handler.registry();
        self.params = TrackerParams::from_registry(registry);
        for channel in 0..self.config.channels {
            let rates = StreamRateParams::from_registry(registry, channel);
            self.telemetry.set_rates(channel, &rates);
        }
    }

    fn count_filtered(&mut self) {
        self.stats.filtered_messages = self.stats.filtered_messages.wrapping_add(1);
    }
}

/// Stream group addressed by a REQUEST_DATA_STREAM stream id
fn stream_for_request(id: u8) -> Option<StreamId> {
    const STREAMS: [(MavDataStream, StreamId); 8] = [
        (MavDataStream::MAV_DATA_STREAM_RAW_SENSORS, StreamId::RawSensors),
        (MavDataStream::MAV_DATA_STREAM_EXTENDED_STATUS, StreamId::ExtendedStatus),
        (MavDataStream::MAV_DATA_STREAM_RC_CHANNELS, StreamId::RcChannels),
        (MavDataStream::MAV_DATA_STREAM_RAW_CONTROLLER, StreamId::RawController),
        (MavDataStream::MAV_DATA_STREAM_POSITION, StreamId::Position),
        (MavDataStream::MAV_DATA_STREAM_EXTRA1, StreamId::Extra1),
        (MavDataStream::MAV_DATA_STREAM_EXTRA2, StreamId::Extra2),
        (MavDataStream::MAV_DATA_STREAM_EXTRA3, StreamId::Extra3),
    ];

    STREAMS
        .iter()
        .find(|(data_stream, _)| *data_stream as u8 == id)
        .map(|(_, stream)| *stream)
}
