//! End-to-end protocol tests against the public router API

use mavlink::ardupilotmega::{
    AttitudeTargetTypemask, MavCmd, MavDataStream, MavFrame, MavMessage, MavMissionResult,
    MavModeFlag, MavResult, MavType, COMMAND_LONG_DATA, GLOBAL_POSITION_INT_DATA,
    HEARTBEAT_DATA, MANUAL_CONTROL_DATA, MISSION_ITEM_DATA, MISSION_WRITE_PARTIAL_LIST_DATA,
    PARAM_REQUEST_LIST_DATA, REQUEST_DATA_STREAM_DATA, SCALED_PRESSURE_DATA,
    SET_ATTITUDE_TARGET_DATA,
};
use mavlink::MavHeader;
use nalgebra::Quaternion;
use pico_tracker::communication::mavlink::{
    Destination, MavlinkConfig, MavlinkRouter, Responses, RouterError,
};
use pico_tracker::core::location::{AltFrame, Location};
use pico_tracker::tracker::{
    ArmingControl, GuidedMode, HomeControl, Mode, ModeControl, ModeReason, NavStatus, PidAxis,
    PidInfo, SafetyState, ServoTestMode, TelemetrySource, TrackerState, TrackingSink,
};
use serial_test::serial;

const GCS: u8 = 255;
const VEHICLE: u8 = 42;
const TXSPACE: usize = 2048;

/// Minimal host firmware
#[derive(Default)]
struct Firmware {
    mode: Option<Mode>,
    armed: bool,
    home: Location,
    positions: u32,
    pressures: u32,
    manual: u32,
    attitude: Option<(Quaternion<f32>, bool)>,
}

impl ModeControl for Firmware {
    fn set_mode(&mut self, mode: Mode, _reason: ModeReason) -> bool {
        self.mode = Some(mode);
        true
    }
}

impl ArmingControl for Firmware {
    fn arm_servos(&mut self) {
        self.armed = true;
    }

    fn disarm_servos(&mut self) {
        self.armed = false;
    }

    fn safety_state(&self) -> SafetyState {
        SafetyState::None
    }

    fn soft_armed(&self) -> bool {
        self.armed
    }
}

impl HomeControl for Firmware {
    fn home(&self) -> Location {
        self.home
    }

    fn set_home(&mut self, location: &Location) -> bool {
        self.home = *location;
        true
    }
}

impl TrackingSink for Firmware {
    fn update_position(&mut self, _sysid: u8, _data: &GLOBAL_POSITION_INT_DATA) {
        self.positions += 1;
    }

    fn update_pressure(&mut self, _sysid: u8, _data: &SCALED_PRESSURE_DATA) {
        self.pressures += 1;
    }

    fn manual_control(&mut self, _data: &MANUAL_CONTROL_DATA) {
        self.manual += 1;
    }
}

impl ServoTestMode for Firmware {
    fn set_servo(&mut self, _channel: u8, _pwm: u16) -> bool {
        true
    }
}

impl GuidedMode for Firmware {
    fn set_angle(&mut self, attitude: Quaternion<f32>, use_yaw_rate: bool, _yaw_rate: f32) {
        self.attitude = Some((attitude, use_yaw_rate));
    }
}

impl TelemetrySource for Firmware {
    fn nav_status(&self) -> NavStatus {
        NavStatus {
            bearing: 90.0,
            distance: 250.0,
            pitch: 5.0,
            alt_difference_baro: 12.0,
            alt_difference_gps: 15.0,
        }
    }

    fn pid_info(&self, _axis: PidAxis) -> Option<PidInfo> {
        None
    }

    fn is_stationary(&self) -> bool {
        true
    }

    fn current_location(&self) -> Location {
        self.home
    }

    fn yaw_centidegrees(&self) -> u16 {
        18_000
    }
}

struct Session {
    router: MavlinkRouter,
    state: TrackerState,
    firmware: Firmware,
    now_us: u64,
}

impl Session {
    fn new() -> Self {
        let config = MavlinkConfig {
            system_id: 2,
            component_id: 1,
            channels: 2,
        };
        Self {
            router: MavlinkRouter::new(config).unwrap(),
            state: TrackerState::new(),
            firmware: Firmware::default(),
            now_us: 0,
        }
    }

    fn recv(
        &mut self,
        channel: usize,
        sysid: u8,
        msg: MavMessage,
    ) -> Result<Responses, RouterError> {
        let header = MavHeader {
            system_id: sysid,
            component_id: if sysid == GCS { 190 } else { 1 },
            sequence: 0,
        };
        self.router.handle_message(
            channel,
            &header,
            &msg,
            self.now_us,
            &mut self.state,
            &mut self.firmware,
        )
    }

    fn tick(&mut self, channel: usize) -> heapless::Vec<MavMessage, 48> {
        self.router
            .update_telemetry(channel, TXSPACE, self.now_us, &self.state, &self.firmware)
    }
}

fn heartbeat(mavtype: MavType) -> MavMessage {
    MavMessage::HEARTBEAT(HEARTBEAT_DATA {
        mavtype,
        mavlink_version: 3,
        ..Default::default()
    })
}

fn command(command: MavCmd, param1: f32, param2: f32) -> MavMessage {
    MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
        command,
        param1,
        param2,
        target_system: 2,
        target_component: 1,
        ..Default::default()
    })
}

fn command_result(replies: &Responses) -> MavResult {
    match replies.iter().find_map(|r| match &r.message {
        MavMessage::COMMAND_ACK(data) => Some(data.result),
        _ => None,
    }) {
        Some(result) => result,
        None => panic!("Expected COMMAND_ACK message"),
    }
}

#[test]
#[serial]
fn test_tracking_session() {
    let mut s = Session::new();

    // Ground station link, never a tracking target
    s.recv(0, GCS, heartbeat(MavType::MAV_TYPE_GCS)).unwrap();
    assert!(!s.state.target_lock().is_locked());
    assert!(s.router.connection(0).unwrap().is_active(s.now_us, 5_000_000));

    // First vehicle heartbeat locks and requests position + pressure
    let replies = s.recv(1, VEHICLE, heartbeat(MavType::MAV_TYPE_FIXED_WING)).unwrap();
    assert_eq!(s.state.target_lock().target_sysid(), Some(VEHICLE));
    let requested: Vec<u8> = replies
        .iter()
        .filter_map(|r| match &r.message {
            MavMessage::REQUEST_DATA_STREAM(data) => {
                assert_eq!(r.destination, Destination::AllChannels);
                assert_eq!(data.target_system, VEHICLE);
                Some(data.req_stream_id)
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        requested,
        vec![
            MavDataStream::MAV_DATA_STREAM_POSITION as u8,
            MavDataStream::MAV_DATA_STREAM_RAW_SENSORS as u8
        ]
    );

    // A second vehicle is ignored from now on
    s.recv(1, 43, heartbeat(MavType::MAV_TYPE_QUADROTOR)).unwrap();
    s.recv(1, 43, MavMessage::GLOBAL_POSITION_INT(Default::default()))
        .unwrap();
    s.recv(1, VEHICLE, MavMessage::GLOBAL_POSITION_INT(Default::default()))
        .unwrap();
    s.recv(1, VEHICLE, MavMessage::SCALED_PRESSURE(Default::default()))
        .unwrap();
    assert_eq!(s.state.target_lock().target_sysid(), Some(VEHICLE));
    assert_eq!(s.firmware.positions, 1);
    assert_eq!(s.firmware.pressures, 1);
    assert_eq!(s.router.stats().filtered_messages, 2);

    // Operator stick input is not filtered
    s.recv(0, GCS, MavMessage::MANUAL_CONTROL(Default::default()))
        .unwrap();
    assert_eq!(s.firmware.manual, 1);
}

#[test]
#[serial]
fn test_home_upload_handshake() {
    let mut s = Session::new();

    // Item without a preceding partial write is rejected
    let item = MavMessage::MISSION_ITEM(MISSION_ITEM_DATA {
        seq: 0,
        frame: MavFrame::MAV_FRAME_GLOBAL,
        x: 10.0,
        y: 20.0,
        z: 100.0,
        ..Default::default()
    });
    let replies = s.recv(0, GCS, item.clone()).unwrap();
    assert!(matches!(
        &replies[0].message,
        MavMessage::MISSION_ACK(data) if data.mavtype == MavMissionResult::MAV_MISSION_ERROR
    ));

    let partial = MavMessage::MISSION_WRITE_PARTIAL_LIST(MISSION_WRITE_PARTIAL_LIST_DATA {
        start_index: 0,
        end_index: 0,
        target_system: 2,
        target_component: 1,
        ..Default::default()
    });
    let replies = s.recv(0, GCS, partial).unwrap();
    assert!(matches!(
        &replies[0].message,
        MavMessage::MISSION_REQUEST(data) if data.seq == 0 && data.target_system == GCS
    ));

    let replies = s.recv(0, GCS, item).unwrap();
    let acks = replies
        .iter()
        .filter(|r| matches!(r.message, MavMessage::MISSION_ACK(_)))
        .count();
    assert_eq!(acks, 1);
    assert!(matches!(
        &replies[0].message,
        MavMessage::MISSION_ACK(data) if data.mavtype == MavMissionResult::MAV_MISSION_ACCEPTED
    ));
    assert_eq!(
        s.firmware.home,
        Location::new(100_000_000, 200_000_000, 10_000, AltFrame::Absolute)
    );
    assert!(replies
        .iter()
        .any(|r| matches!(r.message, MavMessage::STATUSTEXT(_))));
}

#[test]
#[serial]
fn test_guided_attitude_and_heartbeat() {
    let mut s = Session::new();
    let custom = MavModeFlag::MAV_MODE_FLAG_CUSTOM_MODE_ENABLED.bits() as f32;
    let attitude = MavMessage::SET_ATTITUDE_TARGET(SET_ATTITUDE_TARGET_DATA {
        q: [0.707, 0.0, 0.707, 0.0],
        type_mask: AttitudeTargetTypemask::from_bits_truncate(0b0100_0101),
        ..Default::default()
    });

    // Not forwarded outside GUIDED
    s.recv(0, GCS, attitude.clone()).unwrap();
    assert!(s.firmware.attitude.is_none());

    let replies = s
        .recv(0, GCS, command(MavCmd::MAV_CMD_DO_SET_MODE, custom, Mode::Guided as u8 as f32))
        .unwrap();
    assert_eq!(command_result(&replies), MavResult::MAV_RESULT_ACCEPTED);
    assert_eq!(s.state.mode(), Mode::Guided);

    s.recv(0, GCS, attitude).unwrap();
    let (q, use_yaw_rate) = s.firmware.attitude.unwrap();
    assert_eq!(q, Quaternion::new(0.707, 0.0, 0.707, 0.0));
    assert!(!use_yaw_rate);

    let replies = s
        .recv(0, GCS, command(MavCmd::MAV_CMD_COMPONENT_ARM_DISARM, 1.0, 0.0))
        .unwrap();
    assert_eq!(command_result(&replies), MavResult::MAV_RESULT_ACCEPTED);

    let messages = s.tick(0);
    if let MavMessage::HEARTBEAT(data) = &messages[0] {
        assert_eq!(data.custom_mode, 4);
        assert_eq!(data.mavtype, MavType::MAV_TYPE_ANTENNA_TRACKER);
        assert!(data.base_mode.contains(
            MavModeFlag::MAV_MODE_FLAG_GUIDED_ENABLED | MavModeFlag::MAV_MODE_FLAG_SAFETY_ARMED
        ));
    } else {
        panic!("Expected HEARTBEAT message");
    }

    let nav = messages.iter().find_map(|m| match m {
        MavMessage::NAV_CONTROLLER_OUTPUT(data) => Some(data.clone()),
        _ => None,
    });
    let nav = nav.unwrap();
    assert_eq!(nav.target_bearing, 90);
    assert_eq!(nav.wp_dist, 250);
    assert_eq!(nav.alt_error, 12.0);
}

#[test]
#[serial]
fn test_servo_test_and_arm_validation() {
    let mut s = Session::new();
    s.state.sync_mode(Mode::Auto);

    let replies = s
        .recv(0, GCS, command(MavCmd::MAV_CMD_DO_SET_SERVO, 1.0, 1200.0))
        .unwrap();
    assert_eq!(command_result(&replies), MavResult::MAV_RESULT_ACCEPTED);
    assert_eq!(s.state.mode(), Mode::ServoTest);

    let replies = s
        .recv(0, GCS, command(MavCmd::MAV_CMD_COMPONENT_ARM_DISARM, 0.5, 0.0))
        .unwrap();
    assert_eq!(command_result(&replies), MavResult::MAV_RESULT_UNSUPPORTED);
    assert!(!s.firmware.armed);
}

#[test]
#[serial]
fn test_parameter_list_streams_on_requesting_channel() {
    let mut s = Session::new();
    s.recv(
        1,
        GCS,
        MavMessage::PARAM_REQUEST_LIST(PARAM_REQUEST_LIST_DATA {
            target_system: 2,
            target_component: 1,
        }),
    )
    .unwrap();

    let mut channel0 = 0;
    let mut channel1 = 0;
    // 5 tracker params + 2 * 9 stream rates, one per 100ms at SRn_PARAMS=10
    for step in 0..30u64 {
        s.now_us = step * 100_000;
        channel0 += s
            .tick(0)
            .iter()
            .filter(|m| matches!(m, MavMessage::PARAM_VALUE(_)))
            .count();
        channel1 += s
            .tick(1)
            .iter()
            .filter(|m| matches!(m, MavMessage::PARAM_VALUE(_)))
            .count();
    }

    assert_eq!(channel0, 0);
    assert_eq!(channel1, 23);
}

#[test]
#[serial]
fn test_request_data_stream_changes_rate() {
    let mut s = Session::new();
    let request = MavMessage::REQUEST_DATA_STREAM(REQUEST_DATA_STREAM_DATA {
        req_message_rate: 0,
        target_system: 2,
        target_component: 1,
        req_stream_id: MavDataStream::MAV_DATA_STREAM_ALL as u8,
        start_stop: 0,
    });
    s.recv(0, GCS, request).unwrap();

    // Only the heartbeat is left on channel 0
    let messages = s.tick(0);
    assert_eq!(messages.len(), 1);
    assert!(matches!(messages[0], MavMessage::HEARTBEAT(_)));

    // Channel 1 keeps its default rates
    let stationary = s
        .tick(1)
        .iter()
        .any(|m| matches!(m, MavMessage::GLOBAL_POSITION_INT(data) if data.hdg == 18_000));
    assert!(stationary);
}
