//! Home Upload Handler
//!
//! The tracker has no mission storage. It accepts a single uploaded item,
//! item 0, as its new home location through a short handshake:
//!
//! 1. GCS sends MISSION_WRITE_PARTIAL_LIST with start_index 0
//! 2. Tracker enters `AwaitingHome` and requests item 0 (MISSION_REQUEST)
//! 3. GCS sends MISSION_ITEM seq 0; the tracker stores it as home
//! 4. Tracker replies MISSION_ACK and returns to `Idle`
//!
//! Every MISSION_ITEM is answered with exactly one MISSION_ACK.

use crate::communication::mavlink::status_notifier::StatusNotifier;
use crate::core::location::{AltFrame, Location};
use crate::tracker::{HomeControl, TrackerState, UploadSession};
use mavlink::ardupilotmega::{
    MavFrame, MavMessage, MavMissionResult, MavMissionType, MISSION_ACK_DATA, MISSION_ITEM_DATA,
    MISSION_REQUEST_DATA, MISSION_WRITE_PARTIAL_LIST_DATA,
};
use mavlink::MavHeader;

/// Home upload handler
#[derive(Debug, Default)]
pub struct MissionHandler {}

impl MissionHandler {
    /// Create a new mission handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle MISSION_WRITE_PARTIAL_LIST
    ///
    /// Returns the request for item 0 when a home upload starts, `None` for
    /// partial writes that do not start at index 0.
    pub fn handle_write_partial_list(
        &mut self,
        state: &mut TrackerState,
        header: &MavHeader,
        data: &MISSION_WRITE_PARTIAL_LIST_DATA,
    ) -> Option<MavMessage> {
        if data.start_index != 0 {
            crate::log_debug!(
                "Partial list write from index {} ignored",
                data.start_index
            );
            return None;
        }

        state.set_upload(UploadSession::AwaitingHome);
        crate::log_debug!("Home upload started by sysid {}", header.system_id);

        Some(MavMessage::MISSION_REQUEST(MISSION_REQUEST_DATA {
            target_system: header.system_id,
            target_component: header.component_id,
            seq: 0,
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        }))
    }

    /// Handle MISSION_ITEM and build the MISSION_ACK for `header`'s sender
    pub fn handle_mission_item<V: HomeControl + ?Sized>(
        &mut self,
        state: &mut TrackerState,
        vehicle: &mut V,
        notifier: &mut StatusNotifier,
        header: &MavHeader,
        data: &MISSION_ITEM_DATA,
    ) -> MavMessage {
        let result = self.process_item(state, vehicle, notifier, data);
        if result != MavMissionResult::MAV_MISSION_ACCEPTED {
            crate::log_warn!("Mission item {} rejected: {}", data.seq, result as u32);
        }
        mission_ack(header, result)
    }

    fn process_item<V: HomeControl + ?Sized>(
        &mut self,
        state: &mut TrackerState,
        vehicle: &mut V,
        notifier: &mut StatusNotifier,
        data: &MISSION_ITEM_DATA,
    ) -> MavMissionResult {
        let awaiting = state.upload().is_awaiting_home();

        let Some(location) = item_location(data, &vehicle.home()) else {
            if awaiting && data.seq == 0 {
                state.set_upload(UploadSession::Idle);
            }
            return MavMissionResult::MAV_MISSION_UNSUPPORTED_FRAME;
        };

        if !awaiting {
            return MavMissionResult::MAV_MISSION_ERROR;
        }

        if data.seq != 0 {
            // Non-home items are acknowledged but not stored
            return MavMissionResult::MAV_MISSION_ACCEPTED;
        }

        state.set_upload(UploadSession::Idle);

        if !location.is_valid() {
            crate::log_warn!("Home off the globe: lat={} lng={}", location.lat, location.lng);
            return MavMissionResult::MAV_MISSION_ERROR;
        }

        if !vehicle.set_home(&location) {
            return MavMissionResult::MAV_MISSION_ERROR;
        }

        crate::log_info!(
            "New home: lat={} lng={} alt={}cm",
            location.lat,
            location.lng,
            location.alt
        );
        notifier.send_info("New HOME received");
        MavMissionResult::MAV_MISSION_ACCEPTED
    }
}

/// Convert a mission item's coordinates to a [`Location`]
///
/// Returns `None` for frames the tracker does not understand. Local NED items
/// are offsets from `home`.
pub fn item_location(data: &MISSION_ITEM_DATA, home: &Location) -> Option<Location> {
    match data.frame {
        MavFrame::MAV_FRAME_GLOBAL | MavFrame::MAV_FRAME_MISSION => Some(Location::from_degrees(
            data.x,
            data.y,
            data.z,
            AltFrame::Absolute,
        )),
        MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT => Some(Location::from_degrees(
            data.x,
            data.y,
            data.z,
            AltFrame::AboveHome,
        )),
        MavFrame::MAV_FRAME_LOCAL_NED => {
            Some(Location::from_local_ned(home, data.x, data.y, data.z))
        }
        _ => None,
    }
}

fn mission_ack(header: &MavHeader, result: MavMissionResult) -> MavMessage {
    MavMessage::MISSION_ACK(MISSION_ACK_DATA {
        target_system: header.system_id,
        target_component: header.component_id,
        mavtype: result,
        mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        opaque_id: 0,
    })
}
