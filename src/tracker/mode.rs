//! Tracker operating modes
//!
//! Modes are a closed set identified on the wire by their custom-mode number.
//! Mode behaviours live outside this crate; the protocol layer only needs the
//! identity of the current mode and the small capability table below.
//!
//! ## Available Modes
//!
//! - **Manual**: Operator drives the servos directly
//! - **Stop**: Servos hold position
//! - **Scan**: Sweep looking for the vehicle
//! - **ServoTest**: Servo outputs set by MAV_CMD_DO_SET_SERVO
//! - **Guided**: Attitude set by SET_ATTITUDE_TARGET
//! - **Auto**: Track the target vehicle
//! - **Initialising**: Startup, sensors calibrating

/// Tracker operating mode
///
/// Discriminants are the ArduPilot AntennaTracker custom-mode numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    Manual = 0,
    Stop = 1,
    Scan = 2,
    ServoTest = 3,
    Guided = 4,
    Auto = 10,
    #[default]
    Initialising = 16,
}

/// Autonomy class reported in HEARTBEAT base_mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GuidedCapability {
    /// No autonomy flags
    NoAutonomy,
    /// Operator input drives the tracker
    ManualInput,
    /// Tracker points itself (guided and stabilized)
    GuidedStabilized,
}

/// Capability table entry for one mode
#[derive(Debug, Clone, Copy)]
struct ModeInfo {
    mode: Mode,
    name: &'static str,
    capability: GuidedCapability,
    arm_eligible: bool,
}

static MODE_TABLE: [ModeInfo; 7] = [
    ModeInfo {
        mode: Mode::Manual,
        name: "MANUAL",
        capability: GuidedCapability::ManualInput,
        arm_eligible: true,
    },
    ModeInfo {
        mode: Mode::Stop,
        name: "STOP",
        capability: GuidedCapability::NoAutonomy,
        arm_eligible: true,
    },
    ModeInfo {
        mode: Mode::Scan,
        name: "SCAN",
        capability: GuidedCapability::GuidedStabilized,
        arm_eligible: true,
    },
    ModeInfo {
        mode: Mode::ServoTest,
        name: "SERVOTEST",
        capability: GuidedCapability::GuidedStabilized,
        arm_eligible: true,
    },
    ModeInfo {
        mode: Mode::Guided,
        name: "GUIDED",
        capability: GuidedCapability::GuidedStabilized,
        arm_eligible: true,
    },
    ModeInfo {
        mode: Mode::Auto,
        name: "AUTO",
        capability: GuidedCapability::GuidedStabilized,
        arm_eligible: true,
    },
    ModeInfo {
        mode: Mode::Initialising,
        name: "INITIALISING",
        capability: GuidedCapability::NoAutonomy,
        arm_eligible: false,
    },
];

impl Mode {
    /// All modes in table order
    pub const ALL: [Mode; 7] = [
        Mode::Manual,
        Mode::Stop,
        Mode::Scan,
        Mode::ServoTest,
        Mode::Guided,
        Mode::Auto,
        Mode::Initialising,
    ];

    fn info(self) -> &'static ModeInfo {
        // MODE_TABLE is indexed in ALL order
        let index = match self {
            Mode::Manual => 0,
            Mode::Stop => 1,
            Mode::Scan => 2,
            Mode::ServoTest => 3,
            Mode::Guided => 4,
            Mode::Auto => 5,
            Mode::Initialising => 6,
        };
        &MODE_TABLE[index]
    }

    /// Convert a MAVLink custom mode number to a mode
    pub fn from_custom_mode(custom_mode: u32) -> Option<Self> {
        MODE_TABLE
            .iter()
            .find(|info| info.mode.to_custom_mode() == custom_mode)
            .map(|info| info.mode)
    }

    /// MAVLink custom mode number
    pub const fn to_custom_mode(self) -> u32 {
        self as u32
    }

    /// Guided-capability class used for HEARTBEAT base_mode
    pub fn guided_capability(self) -> GuidedCapability {
        self.info().capability
    }

    /// Whether the armed flag may be reported in this mode
    pub fn arm_eligible(self) -> bool {
        self.info().arm_eligible
    }

    /// Human-readable mode name
    pub fn as_str(self) -> &'static str {
        self.info().name
    }
}

/// Why a mode change was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeReason {
    /// MAV_CMD_DO_SET_MODE from a ground station
    GcsCommand,
    /// MAV_CMD_DO_SET_SERVO forcing servo test
    ServoTest,
    /// MAV_CMD_MISSION_START
    MissionStart,
}

impl ModeReason {
    /// Short label for logging
    pub fn as_str(self) -> &'static str {
        match self {
            ModeReason::GcsCommand => "GCS command",
            ModeReason::ServoTest => "servo test",
            ModeReason::MissionStart => "mission start",
        }
    }
}
