//! Telemetry stream group registry
//!
//! Static mapping from stream groups to the message kinds they emit. The
//! scheduler walks [`STREAM_ENTRIES`] in order on every tick; membership never
//! changes at runtime.
//!
//! | Group | Members |
//! |---|---|
//! | RAW_SENS | RAW_IMU, SCALED_IMU2, SCALED_IMU3, SCALED_PRESSURE, SCALED_PRESSURE2, SCALED_PRESSURE3 |
//! | EXT_STAT | SYS_STATUS, POWER_STATUS, MCU_STATUS, MEMINFO, NAV_CONTROLLER_OUTPUT, GPS_RAW_INT, GPS_RTK, GPS2_RAW, GPS2_RTK |
//! | POSITION | GLOBAL_POSITION_INT, LOCAL_POSITION_NED |
//! | RAW_CTRL | SERVO_OUTPUT_RAW |
//! | RC_CHAN | RC_CHANNELS, RC_CHANNELS_RAW (MAVLink 1 only) |
//! | EXTRA1 | ATTITUDE, PID_TUNING |
//! | EXTRA3 | AHRS, SIMSTATE, SYSTEM_TIME, AHRS2, MAG_CAL_REPORT, MAG_CAL_PROGRESS, EKF_STATUS_REPORT |
//! | PARAMS | next queued PARAM_VALUE |
//!
//! EXTRA2 has a rate parameter but no members.

/// Number of stream rate slots (including EXTRA2)
pub const STREAM_COUNT: usize = 9;

/// Telemetry stream group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamId {
    RawSensors,
    ExtendedStatus,
    RcChannels,
    RawController,
    Position,
    Extra1,
    Extra2,
    Extra3,
    Params,
}

impl StreamId {
    /// All groups in parameter order
    pub const ALL: [StreamId; STREAM_COUNT] = [
        StreamId::RawSensors,
        StreamId::ExtendedStatus,
        StreamId::RcChannels,
        StreamId::RawController,
        StreamId::Position,
        StreamId::Extra1,
        StreamId::Extra2,
        StreamId::Extra3,
        StreamId::Params,
    ];

    /// Slot index used for rate tables
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parameter name suffix (`SRn_<suffix>`)
    pub const fn name(self) -> &'static str {
        match self {
            StreamId::RawSensors => "RAW_SENS",
            StreamId::ExtendedStatus => "EXT_STAT",
            StreamId::RcChannels => "RC_CHAN",
            StreamId::RawController => "RAW_CTRL",
            StreamId::Position => "POSITION",
            StreamId::Extra1 => "EXTRA1",
            StreamId::Extra2 => "EXTRA2",
            StreamId::Extra3 => "EXTRA3",
            StreamId::Params => "PARAMS",
        }
    }
}

/// Message kinds emitted by stream groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    RawImu,
    ScaledImu2,
    ScaledImu3,
    ScaledPressure,
    ScaledPressure2,
    ScaledPressure3,
    SysStatus,
    PowerStatus,
    McuStatus,
    Meminfo,
    NavControllerOutput,
    GpsRaw,
    GpsRtk,
    Gps2Raw,
    Gps2Rtk,
    Location,
    LocalPosition,
    ServoOutputRaw,
    RcChannels,
    RcChannelsRaw,
    Attitude,
    PidTuning,
    Ahrs,
    SimState,
    SystemTime,
    Ahrs2,
    MagCalReport,
    MagCalProgress,
    EkfStatusReport,
    NextParam,
}

impl MessageKind {
    /// Largest MAVLink 2 payload for this kind, extensions included (bytes)
    pub const fn max_payload_len(self) -> usize {
        match self {
            MessageKind::RawImu => 29,
            MessageKind::ScaledImu2 | MessageKind::ScaledImu3 => 24,
            MessageKind::ScaledPressure
            | MessageKind::ScaledPressure2
            | MessageKind::ScaledPressure3 => 16,
            MessageKind::SysStatus => 43,
            MessageKind::PowerStatus => 6,
            MessageKind::McuStatus => 9,
            MessageKind::Meminfo => 8,
            MessageKind::NavControllerOutput => 26,
            MessageKind::GpsRaw => 52,
            MessageKind::GpsRtk | MessageKind::Gps2Rtk => 35,
            MessageKind::Gps2Raw => 57,
            MessageKind::Location => 28,
            MessageKind::LocalPosition => 28,
            MessageKind::ServoOutputRaw => 37,
            MessageKind::RcChannels => 42,
            MessageKind::RcChannelsRaw => 22,
            MessageKind::Attitude => 28,
            MessageKind::PidTuning => 33,
            MessageKind::Ahrs => 28,
            MessageKind::SimState => 44,
            MessageKind::SystemTime => 12,
            MessageKind::Ahrs2 => 24,
            MessageKind::MagCalReport => 54,
            MessageKind::MagCalProgress => 27,
            MessageKind::EkfStatusReport => 26,
            MessageKind::NextParam => 25,
        }
    }

    /// Only sent on MAVLink 1 links
    pub const fn mavlink1_only(self) -> bool {
        matches!(self, MessageKind::RcChannelsRaw)
    }

    /// Whether building this kind moves a per-channel cursor
    pub const fn advances_cursor(self) -> bool {
        matches!(self, MessageKind::NextParam)
    }
}

/// One stream group and its members
#[derive(Debug)]
pub struct StreamEntry {
    pub stream: StreamId,
    pub members: &'static [MessageKind],
}

static RAW_SENSORS_MSGS: [MessageKind; 6] = [
    MessageKind::RawImu,
    MessageKind::ScaledImu2,
    MessageKind::ScaledImu3,
    MessageKind::ScaledPressure,
    MessageKind::ScaledPressure2,
    MessageKind::ScaledPressure3,
];

static EXTENDED_STATUS_MSGS: [MessageKind; 9] = [
    MessageKind::SysStatus,
    MessageKind::PowerStatus,
    MessageKind::McuStatus,
    MessageKind::Meminfo,
    MessageKind::NavControllerOutput,
    MessageKind::GpsRaw,
    MessageKind::GpsRtk,
    MessageKind::Gps2Raw,
    MessageKind::Gps2Rtk,
];

static POSITION_MSGS: [MessageKind; 2] = [MessageKind::Location, MessageKind::LocalPosition];

static RAW_CONTROLLER_MSGS: [MessageKind; 1] = [MessageKind::ServoOutputRaw];

static RC_CHANNELS_MSGS: [MessageKind; 2] = [MessageKind::RcChannels, MessageKind::RcChannelsRaw];

static EXTRA1_MSGS: [MessageKind; 2] = [MessageKind::Attitude, MessageKind::PidTuning];

static EXTRA3_MSGS: [MessageKind; 7] = [
    MessageKind::Ahrs,
    MessageKind::SimState,
    MessageKind::SystemTime,
    MessageKind::Ahrs2,
    MessageKind::MagCalReport,
    MessageKind::MagCalProgress,
    MessageKind::EkfStatusReport,
];

static PARAMS_MSGS: [MessageKind; 1] = [MessageKind::NextParam];

/// Scheduled stream groups in emission order
pub static STREAM_ENTRIES: [StreamEntry; 8] = [
    StreamEntry {
        stream: StreamId::RawSensors,
        members: &RAW_SENSORS_MSGS,
    },
    StreamEntry {
        stream: StreamId::ExtendedStatus,
        members: &EXTENDED_STATUS_MSGS,
    },
    StreamEntry {
        stream: StreamId::Position,
        members: &POSITION_MSGS,
    },
    StreamEntry {
        stream: StreamId::RawController,
        members: &RAW_CONTROLLER_MSGS,
    },
    StreamEntry {
        stream: StreamId::RcChannels,
        members: &RC_CHANNELS_MSGS,
    },
    StreamEntry {
        stream: StreamId::Extra1,
        members: &EXTRA1_MSGS,
    },
    StreamEntry {
        stream: StreamId::Extra3,
        members: &EXTRA3_MSGS,
    },
    StreamEntry {
        stream: StreamId::Params,
        members: &PARAMS_MSGS,
    },
];

/// Members of `stream` (empty for EXTRA2)
pub fn members(stream: StreamId) -> &'static [MessageKind] {
    STREAM_ENTRIES
        .iter()
        .find(|entry| entry.stream == stream)
        .map(|entry| entry.members)
        .unwrap_or(&[])
}
