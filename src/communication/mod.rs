//! Communication Protocols
//!
//! # Protocols
//!
//! - **MAVLink**: Ground station and target vehicle traffic
//!   - Target discovery (HEARTBEAT) and tracking input (GLOBAL_POSITION_INT, SCALED_PRESSURE)
//!   - Command execution (COMMAND_LONG, COMMAND_INT, SET_ATTITUDE_TARGET)
//!   - Home upload (MISSION_WRITE_PARTIAL_LIST, MISSION_ITEM)
//!   - Parameter management (PARAM_* messages)
//!   - Rate-grouped telemetry streams
//!
//! Byte framing and CRC are left to the `mavlink` crate and the host transport.

pub mod mavlink;
