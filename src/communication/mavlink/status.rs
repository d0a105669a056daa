//! HEARTBEAT status encoding
//!
//! Pure functions mapping tracker mode and arming inputs to the fields a
//! ground station reads from HEARTBEAT.

use crate::tracker::{GuidedCapability, Mode, SafetyState};
use mavlink::ardupilotmega::{
    MavAutopilot, MavMessage, MavModeFlag, MavState, MavType, HEARTBEAT_DATA,
};

/// base_mode for `mode`, including the armed bit
pub fn base_mode(mode: Mode, safety: SafetyState, soft_armed: bool) -> MavModeFlag {
    let mut flags = MavModeFlag::MAV_MODE_FLAG_CUSTOM_MODE_ENABLED;

    match mode.guided_capability() {
        GuidedCapability::NoAutonomy => {}
        GuidedCapability::ManualInput => {
            flags |= MavModeFlag::MAV_MODE_FLAG_MANUAL_INPUT_ENABLED;
        }
        GuidedCapability::GuidedStabilized => {
            flags |= MavModeFlag::MAV_MODE_FLAG_GUIDED_ENABLED
                | MavModeFlag::MAV_MODE_FLAG_STABILIZE_ENABLED;
        }
    }

    if is_armed(mode, safety, soft_armed) {
        flags |= MavModeFlag::MAV_MODE_FLAG_SAFETY_ARMED;
    }

    flags
}

/// Armed as reported to the ground station
pub fn is_armed(mode: Mode, safety: SafetyState, soft_armed: bool) -> bool {
    safety != SafetyState::Disarmed && mode.arm_eligible() && soft_armed
}

/// system_status for `mode`
pub fn system_status(mode: Mode) -> MavState {
    match mode {
        Mode::Initialising => MavState::MAV_STATE_CALIBRATING,
        _ => MavState::MAV_STATE_ACTIVE,
    }
}

/// custom_mode for `mode`
pub fn custom_mode(mode: Mode) -> u32 {
    mode.to_custom_mode()
}

/// Build the tracker HEARTBEAT
pub fn heartbeat(mode: Mode, safety: SafetyState, soft_armed: bool) -> MavMessage {
    MavMessage::HEARTBEAT(HEARTBEAT_DATA {
        custom_mode: custom_mode(mode),
        mavtype: MavType::MAV_TYPE_ANTENNA_TRACKER,
        autopilot: MavAutopilot::MAV_AUTOPILOT_ARDUPILOTMEGA,
        base_mode: base_mode(mode, safety, soft_armed),
        system_status: system_status(mode),
        mavlink_version: 3,
    })
}
