//! Target Lock Protocol
//!
//! The first heartbeat from a trackable vehicle selects the tracked vehicle
//! for the rest of the session. On lock, the tracker asks the vehicle to
//! stream its position and barometer data.

use crate::communication::mavlink::{push_response, Outbound, Responses};
use crate::core::parameters::{ParamValue, ParameterRegistry};
use crate::tracker::TrackerState;
use mavlink::ardupilotmega::{
    MavDataStream, MavMessage, MavType, HEARTBEAT_DATA, REQUEST_DATA_STREAM_DATA,
};
use mavlink::MavHeader;

/// Parameter holding the tracked vehicle's system ID
const SYSID_TARGET: &str = "SYSID_TARGET";

/// Whether a vehicle of `mavtype` can be tracked
pub fn is_trackable(mavtype: MavType) -> bool {
    !matches!(
        mavtype,
        MavType::MAV_TYPE_ANTENNA_TRACKER
            | MavType::MAV_TYPE_GCS
            | MavType::MAV_TYPE_ONBOARD_CONTROLLER
            | MavType::MAV_TYPE_GIMBAL
    )
}

/// Process a heartbeat for target acquisition
///
/// Returns `true` when this heartbeat committed the lock. `SYSID_TARGET` is
/// only written while it is still 0, so a configured target is never
/// overridden.
pub fn handle_heartbeat(
    state: &mut TrackerState,
    registry: &mut ParameterRegistry,
    header: &MavHeader,
    data: &HEARTBEAT_DATA,
    update_rate_hz: u16,
    responses: &mut Responses,
) -> bool {
    if state.target_lock().is_locked() {
        return false;
    }

    if !is_trackable(data.mavtype) {
        crate::log_trace!("Heartbeat from untrackable sysid {}", header.system_id);
        return false;
    }

    if registry.get_u32_or(SYSID_TARGET, 0) == 0 {
        let sysid = ParamValue::Uint32(header.system_id as u32);
        if let Err(e) = registry.set_by_name(SYSID_TARGET, sysid) {
            crate::log_warn!("Failed to store SYSID_TARGET: {}", e);
        }
    }

    for stream in [
        MavDataStream::MAV_DATA_STREAM_POSITION,
        MavDataStream::MAV_DATA_STREAM_RAW_SENSORS,
    ] {
        push_response(
            responses,
            Outbound::broadcast(request_data_stream(header, stream, update_rate_hz)),
        );
    }

    state.commit_target_lock(header.system_id);
    crate::log_info!(
        "Tracking vehicle sysid {} compid {}",
        header.system_id,
        header.component_id
    );
    true
}

/// REQUEST_DATA_STREAM asking the sender of `header` to start `stream`
fn request_data_stream(header: &MavHeader, stream: MavDataStream, rate_hz: u16) -> MavMessage {
    MavMessage::REQUEST_DATA_STREAM(REQUEST_DATA_STREAM_DATA {
        req_message_rate: rate_hz,
        target_system: header.system_id,
        target_component: header.component_id,
        req_stream_id: stream as u8,
        start_stop: 1,
    })
}
