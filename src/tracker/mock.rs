//! Recording tracker collaborator for tests
//!
//! `MockTracker` implements every collaborator trait, records each call and
//! lets tests choose whether mode changes, servo commands and home updates are
//! accepted.

use super::{
    ArmingControl, GuidedMode, HomeControl, Mode, ModeControl, ModeReason, NavStatus, PidAxis,
    PidInfo, SafetyState, ServoTestMode, TelemetrySource, TrackingSink,
};
use crate::communication::mavlink::streams::MessageKind;
use crate::core::location::{AltFrame, Location};
use heapless::Vec;
use mavlink::ardupilotmega::{
    MavMessage, ATTITUDE_DATA, GLOBAL_POSITION_INT_DATA, GPS_RAW_INT_DATA, LOCAL_POSITION_NED_DATA,
    MANUAL_CONTROL_DATA, RAW_IMU_DATA, RC_CHANNELS_DATA, RC_CHANNELS_RAW_DATA,
    SCALED_PRESSURE_DATA, SERVO_OUTPUT_RAW_DATA, SYSTEM_TIME_DATA, SYS_STATUS_DATA,
};
use nalgebra::Quaternion;

/// Maximum recorded calls per kind
const MAX_RECORDED: usize = 8;

/// Recorded `GuidedMode::set_angle` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleCall {
    pub attitude: Quaternion<f32>,
    pub use_yaw_rate: bool,
    pub yaw_rate: f32,
}

/// Recording tracker collaborator
#[derive(Debug)]
pub struct MockTracker {
    /// Accept mode changes
    pub accept_mode: bool,
    /// Accept servo commands
    pub accept_servo: bool,
    /// Accept home updates
    pub accept_home: bool,

    pub mode_requests: Vec<(Mode, ModeReason), MAX_RECORDED>,
    pub arm_calls: u32,
    pub disarm_calls: u32,
    pub safety: SafetyState,
    pub soft_armed: bool,
    pub home: Location,
    pub home_updates: u32,
    pub servo_calls: Vec<(u8, u16), MAX_RECORDED>,
    pub angle_calls: Vec<AngleCall, MAX_RECORDED>,
    pub positions: Vec<u8, MAX_RECORDED>,
    pub pressures: Vec<u8, MAX_RECORDED>,
    pub manual_inputs: u32,

    pub nav: NavStatus,
    pub pid_pitch: Option<PidInfo>,
    pub pid_yaw: Option<PidInfo>,
    pub stationary: bool,
    pub location: Location,
    pub yaw_cd: u16,
    /// Kinds supplied through `build_message`
    pub supplied: Vec<MessageKind, 16>,
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTracker {
    /// Mock that accepts every request and supplies a few common kinds
    pub fn new() -> Self {
        let mut supplied = Vec::new();
        for kind in [
            MessageKind::RawImu,
            MessageKind::ScaledPressure,
            MessageKind::SysStatus,
            MessageKind::GpsRaw,
            MessageKind::LocalPosition,
            MessageKind::ServoOutputRaw,
            MessageKind::RcChannels,
            MessageKind::RcChannelsRaw,
            MessageKind::Attitude,
            MessageKind::SystemTime,
        ] {
            let _ = supplied.push(kind);
        }

        Self {
            accept_mode: true,
            accept_servo: true,
            accept_home: true,
            mode_requests: Vec::new(),
            arm_calls: 0,
            disarm_calls: 0,
            safety: SafetyState::None,
            soft_armed: false,
            home: Location::new(0, 0, 0, AltFrame::Absolute),
            home_updates: 0,
            servo_calls: Vec::new(),
            angle_calls: Vec::new(),
            positions: Vec::new(),
            pressures: Vec::new(),
            manual_inputs: 0,
            nav: NavStatus::default(),
            pid_pitch: None,
            pid_yaw: None,
            stationary: false,
            location: Location::new(0, 0, 0, AltFrame::Absolute),
            yaw_cd: 0,
            supplied,
        }
    }

    /// Mock that supplies no collaborator-built messages
    pub fn silent() -> Self {
        let mut mock = Self::new();
        mock.supplied.clear();
        mock
    }
}

impl ModeControl for MockTracker {
    fn set_mode(&mut self, mode: Mode, reason: ModeReason) -> bool {
        let _ = self.mode_requests.push((mode, reason));
        self.accept_mode
    }
}

impl ArmingControl for MockTracker {
    fn arm_servos(&mut self) {
        self.arm_calls += 1;
        self.soft_armed = true;
    }

    fn disarm_servos(&mut self) {
        self.disarm_calls += 1;
        self.soft_armed = false;
    }

    fn safety_state(&self) -> SafetyState {
        self.safety
    }

    fn soft_armed(&self) -> bool {
        self.soft_armed
    }
}

impl HomeControl for MockTracker {
    fn home(&self) -> Location {
        self.home
    }

    fn set_home(&mut self, location: &Location) -> bool {
        if !self.accept_home {
            return false;
        }
        self.home = *location;
        self.home_updates += 1;
        true
    }
}

impl TrackingSink for MockTracker {
    fn update_position(&mut self, sysid: u8, _data: &GLOBAL_POSITION_INT_DATA) {
        let _ = self.positions.push(sysid);
    }

    fn update_pressure(&mut self, sysid: u8, _data: &SCALED_PRESSURE_DATA) {
        let _ = self.pressures.push(sysid);
    }

    fn manual_control(&mut self, _data: &MANUAL_CONTROL_DATA) {
        self.manual_inputs += 1;
    }
}

impl ServoTestMode for MockTracker {
    fn set_servo(&mut self, channel: u8, pwm: u16) -> bool {
        let _ = self.servo_calls.push((channel, pwm));
        self.accept_servo
    }
}

impl GuidedMode for MockTracker {
    fn set_angle(&mut self, attitude: Quaternion<f32>, use_yaw_rate: bool, yaw_rate: f32) {
        let _ = self.angle_calls.push(AngleCall {
            attitude,
            use_yaw_rate,
            yaw_rate,
        });
    }
}

impl TelemetrySource for MockTracker {
    fn nav_status(&self) -> NavStatus {
        self.nav
    }

    fn pid_info(&self, axis: PidAxis) -> Option<PidInfo> {
        match axis {
            PidAxis::Pitch => self.pid_pitch,
            PidAxis::Yaw => self.pid_yaw,
        }
    }

    fn is_stationary(&self) -> bool {
        self.stationary
    }

    fn current_location(&self) -> Location {
        self.location
    }

    fn yaw_centidegrees(&self) -> u16 {
        self.yaw_cd
    }

    fn build_message(&self, kind: MessageKind, time_boot_ms: u32) -> Option<MavMessage> {
        if !self.supplied.contains(&kind) {
            return None;
        }

        let msg = match kind {
            MessageKind::RawImu => MavMessage::RAW_IMU(RAW_IMU_DATA::default()),
            MessageKind::ScaledPressure => MavMessage::SCALED_PRESSURE(SCALED_PRESSURE_DATA {
                time_boot_ms,
                ..Default::default()
            }),
            MessageKind::SysStatus => MavMessage::SYS_STATUS(SYS_STATUS_DATA::default()),
            MessageKind::GpsRaw => MavMessage::GPS_RAW_INT(GPS_RAW_INT_DATA::default()),
            MessageKind::Location => {
                MavMessage::GLOBAL_POSITION_INT(GLOBAL_POSITION_INT_DATA {
                    time_boot_ms,
                    ..Default::default()
                })
            }
            MessageKind::LocalPosition => MavMessage::LOCAL_POSITION_NED(LOCAL_POSITION_NED_DATA {
                time_boot_ms,
                ..Default::default()
            }),
            MessageKind::ServoOutputRaw => {
                MavMessage::SERVO_OUTPUT_RAW(SERVO_OUTPUT_RAW_DATA::default())
            }
            MessageKind::RcChannels => MavMessage::RC_CHANNELS(RC_CHANNELS_DATA {
                time_boot_ms,
                ..Default::default()
            }),
            MessageKind::RcChannelsRaw => MavMessage::RC_CHANNELS_RAW(RC_CHANNELS_RAW_DATA {
                time_boot_ms,
                ..Default::default()
            }),
            MessageKind::Attitude => MavMessage::ATTITUDE(ATTITUDE_DATA {
                time_boot_ms,
                ..Default::default()
            }),
            MessageKind::SystemTime => MavMessage::SYSTEM_TIME(SYSTEM_TIME_DATA {
                time_boot_ms,
                ..Default::default()
            }),
            _ => return None,
        };
        Some(msg)
    }
}
