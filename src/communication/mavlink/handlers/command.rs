//! Command Protocol Handler
//!
//! Handles COMMAND_LONG, COMMAND_INT and SET_ATTITUDE_TARGET from the ground
//! station.
//!
//! # Supported Commands
//!
//! - **MAV_CMD_COMPONENT_ARM_DISARM**: Arm or disarm the servos (param1 1.0 / 0.0)
//! - **MAV_CMD_DO_SET_SERVO**: Switch to SERVOTEST and drive one servo
//! - **MAV_CMD_MISSION_START**: Switch to AUTO
//! - **MAV_CMD_DO_SET_MODE**: Change mode by custom mode number
//! - **MAV_CMD_PREFLIGHT_CALIBRATION**: Barometer calibration request (param3 == 1)
//!
//! Every command gets exactly one COMMAND_ACK. Attitude setpoints are never
//! acknowledged; invalid ones are dropped.

use crate::tracker::{
    ArmingControl, GuidedMode, Mode, ModeControl, ModeReason, ServoTestMode, Tracker, TrackerState,
};
use bitflags::bitflags;
use mavlink::ardupilotmega::{
    MavCmd, MavMessage, MavModeFlag, MavResult, COMMAND_ACK_DATA, COMMAND_INT_DATA,
    COMMAND_LONG_DATA, SET_ATTITUDE_TARGET_DATA,
};
use mavlink::MavHeader;
use nalgebra::Quaternion;

bitflags! {
    /// SET_ATTITUDE_TARGET type_mask bits checked before forwarding
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AttitudeMask: u8 {
        const IGNORE_ROLL_RATE = 1 << 0;
        const IGNORE_PITCH_RATE = 1 << 1;
        const IGNORE_YAW_RATE = 1 << 2;
        /// Legacy ignore-pitch-rate bit, absent from the current dialect
        const IGNORE_PITCH_RATE_LEGACY = 1 << 3;
        /// Legacy ignore-yaw-rate bit, absent from the current dialect
        const IGNORE_YAW_RATE_LEGACY = 1 << 4;
        const IGNORE_THROTTLE = 1 << 6;
        const IGNORE_ATTITUDE = 1 << 7;
    }
}

/// Offset of type_mask in the SET_ATTITUDE_TARGET payload (after the u32 and f32 fields
/// and the two target ids)
const SET_ATTITUDE_TARGET_TYPE_MASK_OFFSET: usize = 38;

/// Command handler for COMMAND_LONG / COMMAND_INT and attitude setpoints
#[derive(Debug, Default)]
pub struct CommandHandler {}

impl CommandHandler {
    /// Create a new command handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle COMMAND_LONG and build the COMMAND_ACK for `header`'s sender
    pub fn handle_command_long<V: Tracker>(
        &mut self,
        state: &mut TrackerState,
        vehicle: &mut V,
        header: &MavHeader,
        cmd: &COMMAND_LONG_DATA,
    ) -> MavMessage {
        crate::log_debug!("Received COMMAND_LONG: command={}", cmd.command as u32);

        let result = match cmd.command {
            MavCmd::MAV_CMD_DO_SET_SERVO => {
                self.handle_set_servo(state, vehicle, cmd.param1, cmd.param2)
            }
            MavCmd::MAV_CMD_MISSION_START => self.handle_mission_start(state, vehicle),
            _ => self.handle_common(
                state,
                vehicle,
                cmd.command,
                [cmd.param1, cmd.param2, cmd.param3],
            ),
        };

        command_ack(cmd.command, result, header)
    }

    /// Handle COMMAND_INT and build the COMMAND_ACK for `header`'s sender
    ///
    /// Only the commands shared with COMMAND_LONG's common path are accepted here.
    pub fn handle_command_int<V: Tracker>(
        &mut self,
        state: &mut TrackerState,
        vehicle: &mut V,
        header: &MavHeader,
        cmd: &COMMAND_INT_DATA,
    ) -> MavMessage {
        crate::log_debug!("Received COMMAND_INT: command={}", cmd.command as u32);

        let result = self.handle_common(
            state,
            vehicle,
            cmd.command,
            [cmd.param1, cmd.param2, cmd.param3],
        );
        command_ack(cmd.command, result, header)
    }

    /// Commands accepted through both COMMAND_LONG and COMMAND_INT
    fn handle_common<V: Tracker>(
        &mut self,
        state: &mut TrackerState,
        vehicle: &mut V,
        command: MavCmd,
        params: [f32; 3],
    ) -> MavResult {
        match command {
            MavCmd::MAV_CMD_COMPONENT_ARM_DISARM => handle_arm_disarm(vehicle, params[0]),
            MavCmd::MAV_CMD_DO_SET_MODE => {
                self.handle_set_mode(state, vehicle, params[0], params[1])
            }
            MavCmd::MAV_CMD_PREFLIGHT_CALIBRATION => {
                self.handle_preflight_calibration(state, params[2])
            }
            _ => {
                crate::log_warn!("Unsupported command: {}", command as u32);
                MavResult::MAV_RESULT_UNSUPPORTED
            }
        }
    }

    /// Handle MAV_CMD_DO_SET_SERVO
    ///
    /// param1: servo channel, param2: PWM. The mode is forced to SERVOTEST
    /// before the servo is driven, even if the servo command then fails.
    fn handle_set_servo<V: ModeControl + ServoTestMode>(
        &mut self,
        state: &mut TrackerState,
        vehicle: &mut V,
        channel: f32,
        pwm: f32,
    ) -> MavResult {
        state.set_mode(vehicle, Mode::ServoTest, ModeReason::ServoTest);

        if vehicle.set_servo(channel as u8, pwm as u16) {
            MavResult::MAV_RESULT_ACCEPTED
        } else {
            crate::log_warn!("Servo {} rejected PWM {}", channel as u8, pwm as u16);
            MavResult::MAV_RESULT_FAILED
        }
    }

    /// Handle MAV_CMD_MISSION_START
    fn handle_mission_start<V: ModeControl>(
        &mut self,
        state: &mut TrackerState,
        vehicle: &mut V,
    ) -> MavResult {
        state.set_mode(vehicle, Mode::Auto, ModeReason::MissionStart);
        MavResult::MAV_RESULT_ACCEPTED
    }

    /// Handle MAV_CMD_DO_SET_MODE
    ///
    /// param1: base mode flags (custom mode flag required), param2: custom mode
    fn handle_set_mode<V: ModeControl>(
        &mut self,
        state: &mut TrackerState,
        vehicle: &mut V,
        base_mode: f32,
        custom_mode: f32,
    ) -> MavResult {
        let flags = MavModeFlag::from_bits_truncate(base_mode as u8);
        if !flags.contains(MavModeFlag::MAV_MODE_FLAG_CUSTOM_MODE_ENABLED) {
            crate::log_warn!("DO_SET_MODE without custom mode flag");
            return MavResult::MAV_RESULT_UNSUPPORTED;
        }

        let Some(mode) = Mode::from_custom_mode(custom_mode as u32) else {
            crate::log_warn!("Invalid mode number: {}", custom_mode as u32);
            return MavResult::MAV_RESULT_DENIED;
        };

        if state.set_mode(vehicle, mode, ModeReason::GcsCommand) {
            MavResult::MAV_RESULT_ACCEPTED
        } else {
            MavResult::MAV_RESULT_FAILED
        }
    }

    /// Handle MAV_CMD_PREFLIGHT_CALIBRATION
    ///
    /// Only the barometer (param3 == 1) is calibrated by the tracker.
    fn handle_preflight_calibration(&mut self, state: &mut TrackerState, baro: f32) -> MavResult {
        if baro != 1.0 {
            return MavResult::MAV_RESULT_UNSUPPORTED;
        }

        crate::log_info!("Barometer calibration requested");
        state.set_need_altitude_calibration(true);
        MavResult::MAV_RESULT_ACCEPTED
    }

    /// Validate a SET_ATTITUDE_TARGET and forward it to GUIDED mode
    ///
    /// `type_mask` is the byte as received. The decoded `data.type_mask` drops
    /// the legacy bits, see [`attitude_type_mask`].
    ///
    /// Returns `true` if the setpoint was forwarded.
    pub fn handle_set_attitude_target<V: GuidedMode + ?Sized>(
        &mut self,
        state: &TrackerState,
        vehicle: &mut V,
        data: &SET_ATTITUDE_TARGET_DATA,
        type_mask: u8,
    ) -> bool {
        if state.mode() != Mode::Guided {
            return false;
        }

        let mask = AttitudeMask::from_bits_retain(type_mask);
        if !attitude_target_valid(data.body_roll_rate, mask) {
            crate::log_debug!("Attitude target dropped, type_mask={}", mask.bits());
            return false;
        }

        let use_yaw_rate = !mask.contains(AttitudeMask::IGNORE_YAW_RATE);
        let attitude = Quaternion::new(data.q[0], data.q[1], data.q[2], data.q[3]);
        vehicle.set_angle(attitude, use_yaw_rate, data.body_yaw_rate);
        true
    }
}

/// Handle MAV_CMD_COMPONENT_ARM_DISARM
///
/// param1 1.0 arms, 0.0 disarms. Any other value is unsupported.
pub fn handle_arm_disarm<V: ArmingControl + ?Sized>(vehicle: &mut V, param1: f32) -> MavResult {
    if param1 == 1.0 {
        vehicle.arm_servos();
        crate::log_info!("Servos armed");
        MavResult::MAV_RESULT_ACCEPTED
    } else if param1 == 0.0 {
        vehicle.disarm_servos();
        crate::log_info!("Servos disarmed");
        MavResult::MAV_RESULT_ACCEPTED
    } else {
        MavResult::MAV_RESULT_UNSUPPORTED
    }
}

/// Raw type_mask byte of a SET_ATTITUDE_TARGET payload
///
/// MAVLink 2 trims trailing zero bytes, so a missing byte reads as 0.
pub fn attitude_type_mask(payload: &[u8]) -> u8 {
    payload
        .get(SET_ATTITUDE_TARGET_TYPE_MASK_OFFSET)
        .copied()
        .unwrap_or(0)
}

/// Checks applied to an attitude target, in order
fn attitude_target_valid(body_roll_rate: f32, mask: AttitudeMask) -> bool {
    body_roll_rate == 0.0
        && mask.contains(AttitudeMask::IGNORE_ROLL_RATE)
        && mask.contains(AttitudeMask::IGNORE_THROTTLE)
        && !mask.contains(AttitudeMask::IGNORE_ATTITUDE)
        && !mask.contains(
            AttitudeMask::IGNORE_PITCH_RATE_LEGACY | AttitudeMask::IGNORE_YAW_RATE_LEGACY,
        )
}

/// COMMAND_ACK for `command` addressed to the sender of `header`
pub fn command_ack(command: MavCmd, result: MavResult, header: &MavHeader) -> MavMessage {
    MavMessage::COMMAND_ACK(COMMAND_ACK_DATA {
        command,
        result,
        progress: 0,
        result_param2: 0,
        target_system: header.system_id,
        target_component: header.component_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::mock::MockTracker;
    use mavlink::ardupilotmega::AttitudeTargetTypemask;
    use mavlink::{MavlinkVersion, MessageData};

    const GUIDED_MASK: u8 = 0b0100_0001; // roll rate + throttle ignored

    fn gcs_header() -> MavHeader {
        MavHeader {
            system_id: 255,
            component_id: 190,
            sequence: 0,
        }
    }

    fn create_command_long(command: MavCmd, param1: f32, param2: f32) -> COMMAND_LONG_DATA {
        COMMAND_LONG_DATA {
            command,
            param1,
            param2,
            target_system: 1,
            target_component: 1,
            ..Default::default()
        }
    }

    fn attitude_target(type_mask: u8) -> SET_ATTITUDE_TARGET_DATA {
        SET_ATTITUDE_TARGET_DATA {
            q: [1.0, 0.0, 0.0, 0.0],
            body_yaw_rate: 0.25,
            type_mask: AttitudeTargetTypemask::from_bits_truncate(type_mask),
            ..Default::default()
        }
    }

    fn ack_result(msg: &MavMessage) -> MavResult {
        if let MavMessage::COMMAND_ACK(data) = msg {
            data.result
        } else {
            panic!("Expected COMMAND_ACK message");
        }
    }

    fn run_long(
        state: &mut TrackerState,
        vehicle: &mut MockTracker,
        command: MavCmd,
        param1: f32,
        param2: f32,
    ) -> MavResult {
        let mut handler = CommandHandler::new();
        let ack = handler.handle_command_long(
            state,
            vehicle,
            &gcs_header(),
            &create_command_long(command, param1, param2),
        );
        ack_result(&ack)
    }

    #[test]
    fn test_arm_command_accepted() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();

        let result = run_long(
            &mut state,
            &mut vehicle,
            MavCmd::MAV_CMD_COMPONENT_ARM_DISARM,
            1.0,
            0.0,
        );

        assert_eq!(result, MavResult::MAV_RESULT_ACCEPTED);
        assert_eq!(vehicle.arm_calls, 1);
        assert_eq!(vehicle.disarm_calls, 0);
    }

    #[test]
    fn test_disarm_command_accepted() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();

        let result = run_long(
            &mut state,
            &mut vehicle,
            MavCmd::MAV_CMD_COMPONENT_ARM_DISARM,
            0.0,
            0.0,
        );

        assert_eq!(result, MavResult::MAV_RESULT_ACCEPTED);
        assert_eq!(vehicle.disarm_calls, 1);
        assert_eq!(vehicle.arm_calls, 0);
    }

    #[test]
    fn test_arm_invalid_param_unsupported() {
        let mut vehicle = MockTracker::new();

        assert_eq!(handle_arm_disarm(&mut vehicle, 0.5), MavResult::MAV_RESULT_UNSUPPORTED);
        assert_eq!(handle_arm_disarm(&mut vehicle, 2.0), MavResult::MAV_RESULT_UNSUPPORTED);
        assert_eq!(vehicle.arm_calls, 0);
        assert_eq!(vehicle.disarm_calls, 0);
    }

    #[test]
    fn test_arm_via_command_int() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();
        let mut handler = CommandHandler::new();

        let cmd = COMMAND_INT_DATA {
            command: MavCmd::MAV_CMD_COMPONENT_ARM_DISARM,
            param1: 1.0,
            ..Default::default()
        };
        let ack = handler.handle_command_int(&mut state, &mut vehicle, &gcs_header(), &cmd);

        assert_eq!(ack_result(&ack), MavResult::MAV_RESULT_ACCEPTED);
        assert_eq!(vehicle.arm_calls, 1);
    }

    #[test]
    fn test_set_servo_forces_servotest() {
        let mut state = TrackerState::new();
        state.sync_mode(Mode::Auto);
        let mut vehicle = MockTracker::new();

        let result = run_long(&mut state, &mut vehicle, MavCmd::MAV_CMD_DO_SET_SERVO, 2.0, 1500.0);

        assert_eq!(result, MavResult::MAV_RESULT_ACCEPTED);
        assert_eq!(state.mode(), Mode::ServoTest);
        assert_eq!(vehicle.mode_requests[0], (Mode::ServoTest, ModeReason::ServoTest));
        assert_eq!(vehicle.servo_calls.as_slice(), &[(2, 1500)]);
    }

    #[test]
    fn test_set_servo_rejected_fails() {
        let mut state = TrackerState::new();
        state.sync_mode(Mode::Auto);
        let mut vehicle = MockTracker::new();
        vehicle.accept_servo = false;

        let result = run_long(&mut state, &mut vehicle, MavCmd::MAV_CMD_DO_SET_SERVO, 2.0, 3000.0);

        assert_eq!(result, MavResult::MAV_RESULT_FAILED);
        assert_eq!(state.mode(), Mode::ServoTest);
    }

    #[test]
    fn test_mission_start_always_accepted() {
        let mut state = TrackerState::new();
        state.sync_mode(Mode::Manual);
        let mut vehicle = MockTracker::new();
        vehicle.accept_mode = false;

        let result = run_long(&mut state, &mut vehicle, MavCmd::MAV_CMD_MISSION_START, 0.0, 0.0);

        assert_eq!(result, MavResult::MAV_RESULT_ACCEPTED);
        assert_eq!(vehicle.mode_requests[0], (Mode::Auto, ModeReason::MissionStart));
    }

    #[test]
    fn test_set_mode_accepted() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();
        let custom = MavModeFlag::MAV_MODE_FLAG_CUSTOM_MODE_ENABLED.bits() as f32;

        let result = run_long(&mut state, &mut vehicle, MavCmd::MAV_CMD_DO_SET_MODE, custom, 2.0);

        assert_eq!(result, MavResult::MAV_RESULT_ACCEPTED);
        assert_eq!(state.mode(), Mode::Scan);
    }

    #[test]
    fn test_set_mode_invalid_denied() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();
        let custom = MavModeFlag::MAV_MODE_FLAG_CUSTOM_MODE_ENABLED.bits() as f32;

        let result = run_long(&mut state, &mut vehicle, MavCmd::MAV_CMD_DO_SET_MODE, custom, 99.0);

        assert_eq!(result, MavResult::MAV_RESULT_DENIED);
        assert_eq!(state.mode(), Mode::Initialising);
        assert!(vehicle.mode_requests.is_empty());
    }

    #[test]
    fn test_set_mode_rejected_fails() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();
        vehicle.accept_mode = false;
        let custom = MavModeFlag::MAV_MODE_FLAG_CUSTOM_MODE_ENABLED.bits() as f32;

        let result = run_long(&mut state, &mut vehicle, MavCmd::MAV_CMD_DO_SET_MODE, custom, 4.0);

        assert_eq!(result, MavResult::MAV_RESULT_FAILED);
        assert_eq!(state.mode(), Mode::Initialising);
    }

    #[test]
    fn test_set_mode_without_custom_flag_unsupported() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();

        let result = run_long(&mut state, &mut vehicle, MavCmd::MAV_CMD_DO_SET_MODE, 0.0, 4.0);

        assert_eq!(result, MavResult::MAV_RESULT_UNSUPPORTED);
    }

    #[test]
    fn test_baro_calibration_sets_flag() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();
        let mut handler = CommandHandler::new();

        let cmd = COMMAND_LONG_DATA {
            command: MavCmd::MAV_CMD_PREFLIGHT_CALIBRATION,
            param3: 1.0,
            ..Default::default()
        };
        let ack = handler.handle_command_long(&mut state, &mut vehicle, &gcs_header(), &cmd);

        assert_eq!(ack_result(&ack), MavResult::MAV_RESULT_ACCEPTED);
        assert!(state.need_altitude_calibration());
    }

    #[test]
    fn test_unsupported_command() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();

        let result = run_long(&mut state, &mut vehicle, MavCmd::MAV_CMD_NAV_TAKEOFF, 0.0, 0.0);

        assert_eq!(result, MavResult::MAV_RESULT_UNSUPPORTED);
    }

    #[test]
    fn test_command_ack_fields() {
        let mut state = TrackerState::new();
        let mut vehicle = MockTracker::new();
        let mut handler = CommandHandler::new();

        let ack = handler.handle_command_long(
            &mut state,
            &mut vehicle,
            &gcs_header(),
            &create_command_long(MavCmd::MAV_CMD_COMPONENT_ARM_DISARM, 1.0, 0.0),
        );

        if let MavMessage::COMMAND_ACK(data) = ack {
            assert_eq!(data.command, MavCmd::MAV_CMD_COMPONENT_ARM_DISARM);
            assert_eq!(data.target_system, 255);
            assert_eq!(data.target_component, 190);
        } else {
            panic!("Expected COMMAND_ACK message");
        }
    }

    #[test]
    fn test_attitude_target_forwarded_in_guided() {
        let mut state = TrackerState::new();
        state.sync_mode(Mode::Guided);
        let mut vehicle = MockTracker::new();
        let mut handler = CommandHandler::new();

        let target = attitude_target(GUIDED_MASK);
        assert!(handler.handle_set_attitude_target(&state, &mut vehicle, &target, GUIDED_MASK));

        assert_eq!(vehicle.angle_calls.len(), 1);
        let call = vehicle.angle_calls[0];
        assert_eq!(call.attitude, Quaternion::new(1.0, 0.0, 0.0, 0.0));
        assert!(call.use_yaw_rate);
        assert_eq!(call.yaw_rate, 0.25);
    }

    #[test]
    fn test_attitude_target_ignored_outside_guided() {
        let mut state = TrackerState::new();
        state.sync_mode(Mode::Manual);
        let mut vehicle = MockTracker::new();
        let mut handler = CommandHandler::new();

        let target = attitude_target(GUIDED_MASK);
        assert!(!handler.handle_set_attitude_target(&state, &mut vehicle, &target, GUIDED_MASK));
        assert!(vehicle.angle_calls.is_empty());
    }

    #[test]
    fn test_attitude_target_yaw_rate_ignored() {
        let mut state = TrackerState::new();
        state.sync_mode(Mode::Guided);
        let mut vehicle = MockTracker::new();
        let mut handler = CommandHandler::new();

        let mask = GUIDED_MASK | 0b100;
        handler.handle_set_attitude_target(&state, &mut vehicle, &attitude_target(mask), mask);

        assert!(!vehicle.angle_calls[0].use_yaw_rate);
    }

    #[test]
    fn test_attitude_target_rejections() {
        let mut state = TrackerState::new();
        state.sync_mode(Mode::Guided);
        let mut handler = CommandHandler::new();

        let mut rolling = attitude_target(GUIDED_MASK);
        rolling.body_roll_rate = 0.1;

        let rejected = [
            (rolling, GUIDED_MASK),
            (attitude_target(0b0100_0000), 0b0100_0000), // roll rate not ignored
            (attitude_target(0b0000_0001), 0b0000_0001), // throttle not ignored
            (attitude_target(GUIDED_MASK), GUIDED_MASK | 0b1000_0000), // attitude ignored
            (attitude_target(GUIDED_MASK), GUIDED_MASK | 0b0001_1000), // both legacy rate bits
        ];

        for (data, mask) in rejected.iter() {
            let mut vehicle = MockTracker::new();
            assert!(!handler.handle_set_attitude_target(&state, &mut vehicle, data, *mask));
            assert!(vehicle.angle_calls.is_empty());
        }

        // One legacy bit alone is fine
        let mut vehicle = MockTracker::new();
        let target = attitude_target(GUIDED_MASK);
        let mask = GUIDED_MASK | 0b0000_1000;
        assert!(handler.handle_set_attitude_target(&state, &mut vehicle, &target, mask));
    }

    /// Encode `data` as a MAVLink 2 payload with `type_mask` written as raw bits
    fn encode_attitude_target(data: &SET_ATTITUDE_TARGET_DATA, type_mask: u8) -> ([u8; 64], usize) {
        let mut payload = [0u8; 64];
        let len = data.ser(MavlinkVersion::V2, &mut payload);
        payload[SET_ATTITUDE_TARGET_TYPE_MASK_OFFSET] = type_mask;
        (payload, len.max(SET_ATTITUDE_TARGET_TYPE_MASK_OFFSET + 1))
    }

    #[test]
    fn test_decoded_attitude_target_with_legacy_bits_dropped() {
        let mut state = TrackerState::new();
        state.sync_mode(Mode::Guided);
        let mut vehicle = MockTracker::new();
        let mut handler = CommandHandler::new();

        // Roll rate, both legacy rate bits and throttle ignored
        let raw_mask = 0b0101_1001;
        let (payload, len) = encode_attitude_target(&attitude_target(GUIDED_MASK), raw_mask);
        let payload = &payload[..len];

        let decoded = SET_ATTITUDE_TARGET_DATA::deser(MavlinkVersion::V2, payload).unwrap();
        assert_eq!(decoded.type_mask.bits() & 0b0001_1000, 0);
        assert_eq!(attitude_type_mask(payload), raw_mask);

        let mask = attitude_type_mask(payload);
        assert!(!handler.handle_set_attitude_target(&state, &mut vehicle, &decoded, mask));
        assert!(vehicle.angle_calls.is_empty());
    }

    #[test]
    fn test_decoded_attitude_target_forwarded() {
        let mut state = TrackerState::new();
        state.sync_mode(Mode::Guided);
        let mut vehicle = MockTracker::new();
        let mut handler = CommandHandler::new();

        let (payload, len) = encode_attitude_target(&attitude_target(GUIDED_MASK), GUIDED_MASK);
        let payload = &payload[..len];
        let decoded = SET_ATTITUDE_TARGET_DATA::deser(MavlinkVersion::V2, payload).unwrap();

        let mask = attitude_type_mask(payload);
        assert!(handler.handle_set_attitude_target(&state, &mut vehicle, &decoded, mask));
        assert_eq!(vehicle.angle_calls[0].yaw_rate, 0.25);
    }

    #[test]
    fn test_attitude_type_mask_of_trimmed_payload() {
        assert_eq!(attitude_type_mask(&[0u8; 20]), 0);
    }
}
