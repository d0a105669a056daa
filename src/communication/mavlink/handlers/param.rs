//! MAVLink Parameter Protocol Handler
//!
//! Implements parameter read/write protocol for Ground Control Stations.
//!
//! # Supported Messages
//!
//! - **PARAM_REQUEST_LIST**: Start streaming all parameters on the requesting channel
//! - **PARAM_REQUEST_READ**: Send specific parameter by index or name
//! - **PARAM_SET**: Update parameter value with validation
//!
//! # Parameter Streaming
//!
//! A full list is not sent at once. PARAM_REQUEST_LIST resets a per-channel
//! cursor and the PARAMS telemetry group pulls one PARAM_VALUE per due tick
//! through [`ParamHandler::next_param`].

use crate::communication::mavlink::MAX_CHANNELS;
use crate::core::parameters::{
    ParamMetadata, ParamType, ParamValue, ParameterRegistry, RegistryError,
};
use mavlink::ardupilotmega::{
    MavMessage, MavParamType, PARAM_REQUEST_READ_DATA, PARAM_SET_DATA, PARAM_VALUE_DATA,
};

/// Parameter handler error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamHandlerError {
    /// Parameter not found
    NotFound,
    /// Invalid parameter value
    InvalidValue,
    /// Registry error
    RegistryError,
}

impl From<RegistryError> for ParamHandlerError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound => ParamHandlerError::NotFound,
            RegistryError::InvalidValue => ParamHandlerError::InvalidValue,
            _ => ParamHandlerError::RegistryError,
        }
    }
}

impl core::fmt::Display for ParamHandlerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParamHandlerError::NotFound => write!(f, "parameter not found"),
            ParamHandlerError::InvalidValue => write!(f, "invalid parameter value"),
            ParamHandlerError::RegistryError => write!(f, "parameter registry error"),
        }
    }
}

/// Parameter protocol handler
///
/// Handles PARAM_* messages from GCS and owns the parameter registry.
#[derive(Debug)]
pub struct ParamHandler {
    /// Parameter registry
    registry: ParameterRegistry,
    /// Next index to stream per channel (`None` = no list in progress)
    list_cursor: [Option<usize>; MAX_CHANNELS],
}

impl ParamHandler {
    /// Create a parameter handler around an already populated registry
    pub fn new(registry: ParameterRegistry) -> Self {
        Self {
            registry,
            list_cursor: [None; MAX_CHANNELS],
        }
    }

    /// Get parameter count
    pub fn count(&self) -> usize {
        self.registry.count()
    }

    /// Handle PARAM_REQUEST_LIST received on `channel`
    ///
    /// Restarts the list from index 0 on that channel.
    pub fn handle_request_list(&mut self, channel: usize) {
        if let Some(cursor) = self.list_cursor.get_mut(channel) {
            crate::log_debug!("Parameter list requested on channel {}", channel);
            *cursor = Some(0);
        }
    }

    /// Whether a parameter list is being streamed on `channel`
    pub fn list_pending(&self, channel: usize) -> bool {
        self.list_cursor.get(channel).is_some_and(|c| c.is_some())
    }

    /// Next PARAM_VALUE of an in-progress list on `channel`
    pub fn next_param(&mut self, channel: usize) -> Option<MavMessage> {
        let cursor = self.list_cursor.get_mut(channel)?;
        let index = (*cursor)?;
        let count = self.registry.count();

        let Some(param) = self.registry.get_by_index(index) else {
            *cursor = None;
            return None;
        };

        *cursor = if index + 1 < count {
            Some(index + 1)
        } else {
            None
        };
        Some(create_param_value_message(param, index as u16, count as u16))
    }

    /// Handle PARAM_REQUEST_READ message
    ///
    /// A non-negative index takes precedence over the name. Returns `None` if
    /// the parameter does not exist.
    pub fn handle_request_read(&self, data: &PARAM_REQUEST_READ_DATA) -> Option<MavMessage> {
        let count = self.registry.count();

        if data.param_index >= 0 {
            let index = data.param_index as usize;
            let param = self.registry.get_by_index(index)?;
            return Some(create_param_value_message(param, index as u16, count as u16));
        }

        let name = param_name(&data.param_id)?;
        let index = self.registry.index_of(name)?;
        let param = self.registry.get_by_index(index)?;
        Some(create_param_value_message(param, index as u16, count as u16))
    }

    /// Handle PARAM_SET message
    ///
    /// The value is interpreted with the registered parameter's type, so
    /// integer parameters only accept whole non-negative values.
    ///
    /// # Returns
    ///
    /// The name of the changed parameter and the PARAM_VALUE reply.
    pub fn handle_set(
        &mut self,
        data: &PARAM_SET_DATA,
    ) -> Result<(&'static str, MavMessage), ParamHandlerError> {
        let name = param_name(&data.param_id).ok_or(ParamHandlerError::NotFound)?;
        let index = self
            .registry
            .index_of(name)
            .ok_or(ParamHandlerError::NotFound)?;
        let param_type = self
            .registry
            .get_by_index(index)
            .ok_or(ParamHandlerError::NotFound)?
            .param_type;

        let value = ParamValue::from_f32(data.param_value, param_type)
            .ok_or(ParamHandlerError::InvalidValue)?;

        self.registry.set_by_index(index, value)?;

        let param = self
            .registry
            .get_by_index(index)
            .ok_or(ParamHandlerError::RegistryError)?;
        crate::log_info!("Parameter {} set to {}", param.name, value.as_f32());

        let count = self.registry.count();
        Ok((
            param.name,
            create_param_value_message(param, index as u16, count as u16),
        ))
    }

    /// Get reference to parameter registry
    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    /// Get mutable reference to parameter registry
    pub fn registry_mut(&mut self) -> &mut ParameterRegistry {
        &mut self.registry
    }
}

/// Parameter name from a NUL-padded MAVLink param_id
fn param_name(param_id: &[u8; 16]) -> Option<&str> {
    let end = param_id.iter().position(|b| *b == 0).unwrap_or(param_id.len());
    core::str::from_utf8(&param_id[..end]).ok()
}

/// Create PARAM_VALUE message from parameter metadata
pub fn create_param_value_message(param: &ParamMetadata, index: u16, count: u16) -> MavMessage {
    let mut param_id = [0u8; 16];
    let name_bytes = param.name.as_bytes();
    let copy_len = name_bytes.len().min(16);
    param_id[..copy_len].copy_from_slice(&name_bytes[..copy_len]);

    let param_type = match param.param_type {
        ParamType::Float => MavParamType::MAV_PARAM_TYPE_REAL32,
        ParamType::Uint32 => MavParamType::MAV_PARAM_TYPE_UINT32,
    };

    MavMessage::PARAM_VALUE(PARAM_VALUE_DATA {
        param_value: param.value.as_f32(),
        param_count: count,
        param_index: index,
        param_id,
        param_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{StreamRateParams, TrackerParams};

    fn handler() -> ParamHandler {
        let mut registry = ParameterRegistry::new();
        TrackerParams::register_defaults(&mut registry).unwrap();
        StreamRateParams::register_defaults(&mut registry, 0).unwrap();
        ParamHandler::new(registry)
    }

    fn param_id(name: &str) -> [u8; 16] {
        let mut id = [0u8; 16];
        id[..name.len()].copy_from_slice(name.as_bytes());
        id
    }

    fn read_by_name(name: &str) -> PARAM_REQUEST_READ_DATA {
        PARAM_REQUEST_READ_DATA {
            param_index: -1,
            target_system: 1,
            target_component: 1,
            param_id: param_id(name),
        }
    }

    fn set(name: &str, value: f32) -> PARAM_SET_DATA {
        PARAM_SET_DATA {
            param_value: value,
            target_system: 1,
            target_component: 1,
            param_id: param_id(name),
            param_type: MavParamType::MAV_PARAM_TYPE_REAL32,
        }
    }

    #[test]
    fn test_handler_creation() {
        let handler = handler();
        assert_eq!(handler.count(), 14);
    }

    #[test]
    fn test_request_list_streams_every_parameter() {
        let mut handler = handler();
        assert!(handler.next_param(0).is_none());

        handler.handle_request_list(0);
        assert!(handler.list_pending(0));
        assert!(!handler.list_pending(1));

        let mut indices = std::vec::Vec::new();
        while let Some(msg) = handler.next_param(0) {
            if let MavMessage::PARAM_VALUE(data) = msg {
                assert_eq!(data.param_count, 14);
                indices.push(data.param_index);
            } else {
                panic!("Expected PARAM_VALUE message");
            }
        }

        assert_eq!(indices, (0..14).collect::<std::vec::Vec<u16>>());
        assert!(!handler.list_pending(0));
    }

    #[test]
    fn test_request_list_restarts() {
        let mut handler = handler();
        handler.handle_request_list(0);
        handler.next_param(0);
        handler.next_param(0);

        handler.handle_request_list(0);
        if let Some(MavMessage::PARAM_VALUE(data)) = handler.next_param(0) {
            assert_eq!(data.param_index, 0);
        } else {
            panic!("Expected PARAM_VALUE message");
        }
    }

    #[test]
    fn test_request_read_by_name() {
        let handler = handler();

        let msg = handler.handle_request_read(&read_by_name("SYSID_MYGCS"));

        if let Some(MavMessage::PARAM_VALUE(data)) = msg {
            assert_eq!(data.param_value, 255.0);
            assert_eq!(data.param_index, 1);
            assert_eq!(&data.param_id[..11], b"SYSID_MYGCS");
            assert_eq!(data.param_type, MavParamType::MAV_PARAM_TYPE_UINT32);
        } else {
            panic!("Expected PARAM_VALUE message");
        }
    }

    #[test]
    fn test_request_read_by_index() {
        let handler = handler();
        let request = PARAM_REQUEST_READ_DATA {
            param_index: 0,
            ..read_by_name("IGNORED")
        };

        if let Some(MavMessage::PARAM_VALUE(data)) = handler.handle_request_read(&request) {
            assert_eq!(&data.param_id[..12], b"SYSID_TARGET");
        } else {
            panic!("Expected PARAM_VALUE message");
        }
    }

    #[test]
    fn test_request_read_unknown() {
        let handler = handler();
        assert!(handler.handle_request_read(&read_by_name("NO_SUCH_PARAM")).is_none());

        let request = PARAM_REQUEST_READ_DATA {
            param_index: 200,
            ..read_by_name("")
        };
        assert!(handler.handle_request_read(&request).is_none());
    }

    #[test]
    fn test_set_parameter() {
        let mut handler = handler();

        let (name, msg) = handler.handle_set(&set("SR0_EXTRA1", 4.0)).unwrap();

        assert_eq!(name, "SR0_EXTRA1");
        assert_eq!(handler.registry().get_u32_or("SR0_EXTRA1", 0), 4);
        if let MavMessage::PARAM_VALUE(data) = msg {
            assert_eq!(data.param_value, 4.0);
        } else {
            panic!("Expected PARAM_VALUE message");
        }
    }

    #[test]
    fn test_set_out_of_range_rejected() {
        let mut handler = handler();

        assert_eq!(
            handler.handle_set(&set("SR0_EXTRA1", 51.0)).unwrap_err(),
            ParamHandlerError::InvalidValue
        );
        assert_eq!(
            handler.handle_set(&set("SR0_EXTRA1", 2.5)).unwrap_err(),
            ParamHandlerError::InvalidValue
        );
        assert_eq!(handler.registry().get_u32_or("SR0_EXTRA1", 0), 1);
    }

    #[test]
    fn test_set_unknown_parameter() {
        let mut handler = handler();

        assert_eq!(
            handler.handle_set(&set("NO_SUCH_PARAM", 1.0)).unwrap_err(),
            ParamHandlerError::NotFound
        );
    }

    #[test]
    fn test_full_length_name() {
        let mut registry = ParameterRegistry::new();
        registry
            .register(ParamMetadata::new_float("SIXTEEN_CHAR_NAM", 1.0, 0.0, 2.0))
            .unwrap();
        let mut handler = ParamHandler::new(registry);

        let (name, _) = handler.handle_set(&set("SIXTEEN_CHAR_NAM", 2.0)).unwrap();
        assert_eq!(name, "SIXTEEN_CHAR_NAM");
    }
}
