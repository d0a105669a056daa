//! MAVLink Protocol Handlers
//!
//! Message-specific handlers for the tracker side of the protocol.
//!
//! # Handlers
//!
//! - **Target Lock**: HEARTBEAT from the first trackable vehicle
//! - **Command Handler**: COMMAND_LONG, COMMAND_INT, SET_ATTITUDE_TARGET
//! - **Mission Handler**: MISSION_WRITE_PARTIAL_LIST, MISSION_ITEM (home upload)
//! - **Parameter Handler**: PARAM_REQUEST_LIST, PARAM_REQUEST_READ, PARAM_SET
//! - **Telemetry Streamer**: HEARTBEAT and stream groups per channel

pub mod command;
pub mod mission;
pub mod param;
pub mod target;
pub mod telemetry;

// Re-export commonly used types
pub use command::CommandHandler;
pub use mission::MissionHandler;
pub use param::{ParamHandler, ParamHandlerError};
pub use telemetry::{StreamSources, TelemetryStreamer};
