//! Tracker state and collaborator interfaces
//!
//! The protocol layer owns only the state it needs for its handshakes
//! ([`TrackerState`]). Everything else (servo control, arming, home storage,
//! sensor data) belongs to the host firmware and is reached through the traits
//! in this module. All collaborator calls are synchronous and return a definite
//! result.

pub mod mode;
pub mod state;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use mode::{GuidedCapability, Mode, ModeReason};
pub use state::{latest_snapshot, TargetLock, TrackerSnapshot, TrackerState, UploadSession};

use crate::communication::mavlink::streams::MessageKind;
use crate::core::location::Location;
use mavlink::ardupilotmega::{
    MavMessage, GLOBAL_POSITION_INT_DATA, MANUAL_CONTROL_DATA, SCALED_PRESSURE_DATA,
};
use nalgebra::Quaternion;

/// Safety switch position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyState {
    /// No safety switch fitted
    #[default]
    None,
    /// Switch engaged, outputs inhibited
    Disarmed,
    /// Switch released
    Armed,
}

/// Navigation status reported in NAV_CONTROLLER_OUTPUT
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NavStatus {
    /// Bearing to the vehicle (degrees)
    pub bearing: f32,
    /// Distance to the vehicle (meters)
    pub distance: f32,
    /// Pitch to the vehicle (degrees)
    pub pitch: f32,
    /// Barometric altitude difference (meters)
    pub alt_difference_baro: f32,
    /// GPS altitude difference (meters)
    pub alt_difference_gps: f32,
}

/// Controller axis reported in PID_TUNING
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PidAxis {
    Pitch,
    Yaw,
}

/// Snapshot of one PID controller
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidInfo {
    pub target: f32,
    pub actual: f32,
    pub ff: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub slew_rate: f32,
    pub d_mod: f32,
}

/// Mode transitions
pub trait ModeControl {
    /// Request a transition to `mode`
    ///
    /// Returns `false` if the mode refuses to start.
    fn set_mode(&mut self, mode: Mode, reason: ModeReason) -> bool;
}

/// Servo arming and safety switch
pub trait ArmingControl {
    /// Enable servo outputs
    fn arm_servos(&mut self);

    /// Disable servo outputs
    fn disarm_servos(&mut self);

    /// Current safety switch position
    fn safety_state(&self) -> SafetyState;

    /// Software arm flag
    fn soft_armed(&self) -> bool;
}

/// Home location storage
pub trait HomeControl {
    /// Current home location
    fn home(&self) -> Location;

    /// Replace the home location
    ///
    /// Returns `false` if the location is rejected.
    fn set_home(&mut self, location: &Location) -> bool;
}

/// Inputs for the pointing controller
pub trait TrackingSink {
    /// Position report from the tracked vehicle
    fn update_position(&mut self, sysid: u8, data: &GLOBAL_POSITION_INT_DATA);

    /// Barometer report from the tracked vehicle
    fn update_pressure(&mut self, sysid: u8, data: &SCALED_PRESSURE_DATA);

    /// Operator stick input
    fn manual_control(&mut self, data: &MANUAL_CONTROL_DATA);
}

/// SERVOTEST mode behaviour
pub trait ServoTestMode {
    /// Drive `channel` to `pwm`
    ///
    /// Returns `false` if the channel or value is out of range.
    fn set_servo(&mut self, channel: u8, pwm: u16) -> bool;
}

/// GUIDED mode behaviour
pub trait GuidedMode {
    /// Point at `attitude`, optionally slewing yaw at `yaw_rate` (rad/s)
    fn set_angle(&mut self, attitude: Quaternion<f32>, use_yaw_rate: bool, yaw_rate: f32);
}

/// Data sources for outbound telemetry
pub trait TelemetrySource {
    /// Navigation status toward the tracked vehicle
    fn nav_status(&self) -> NavStatus;

    /// Latest controller values for `axis`, if the controller is running
    fn pid_info(&self, axis: PidAxis) -> Option<PidInfo>;

    /// Whether the tracker is fixed in place
    fn is_stationary(&self) -> bool;

    /// Tracker position
    fn current_location(&self) -> Location;

    /// Heading in centidegrees (0..36000)
    fn yaw_centidegrees(&self) -> u16;

    /// Build a group member this crate does not encode itself
    ///
    /// Returning `None` skips the member for this tick.
    fn build_message(&self, kind: MessageKind, time_boot_ms: u32) -> Option<MavMessage> {
        let _ = (kind, time_boot_ms);
        None
    }
}

/// Everything the protocol layer needs from the host firmware
pub trait Tracker:
    ModeControl
    + ArmingControl
    + HomeControl
    + TrackingSink
    + ServoTestMode
    + GuidedMode
    + TelemetrySource
{
}

impl<T> Tracker for T where
    T: ModeControl
        + ArmingControl
        + HomeControl
        + TrackingSink
        + ServoTestMode
        + GuidedMode
        + TelemetrySource
{
}
