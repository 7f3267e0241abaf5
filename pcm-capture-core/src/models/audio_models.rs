use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute keys reported for a capture device by the native subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAttribute {
    FriendlyName,
    SymbolicLink,
    EndpointId,
    /// Any attribute this crate does not interpret.
    Other,
}

/// An audio capture device discovered by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioDevice {
    pub name: String,
    pub symbolic_link: String,
    pub endpoint_id: String,
}

impl AudioDevice {
    /// Build a device from its attribute set. Unrecognized attributes are skipped.
    pub fn from_attributes<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (DeviceAttribute, S)>,
        S: Into<String>,
    {
        let mut device = Self::default();
        for (key, value) in attributes {
            match key {
                DeviceAttribute::FriendlyName => device.name = value.into(),
                DeviceAttribute::SymbolicLink => device.symbolic_link = value.into(),
                DeviceAttribute::EndpointId => device.endpoint_id = value.into(),
                DeviceAttribute::Other => {}
            }
        }
        device
    }
}

impl fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One delivery to the sample callback.
///
/// Exactly one of `data`, `error` or an end-of-stream tick (`end_of_stream`
/// with no data) is populated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioSample {
    pub data: Option<Vec<u8>>,
    pub error: Option<String>,
    pub end_of_stream: bool,
}

impl AudioSample {
    pub fn with_data(data: Vec<u8>, end_of_stream: bool) -> Self {
        Self {
            data: Some(data),
            error: None,
            end_of_stream,
        }
    }

    /// A delivery that carried no buffer.
    pub fn tick(end_of_stream: bool) -> Self {
        Self {
            data: None,
            error: None,
            end_of_stream,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
            end_of_stream: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of one native frame request, as handed to the capture pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A successful read. `data` is `None` when the subsystem delivered no buffer.
    Sample {
        data: Option<Vec<u8>>,
        end_of_stream: bool,
    },
    /// The read completed with a failure status.
    Failed(String),
}

impl FrameEvent {
    pub fn data(bytes: Vec<u8>, end_of_stream: bool) -> Self {
        Self::Sample {
            data: Some(bytes),
            end_of_stream,
        }
    }

    pub fn end_of_stream() -> Self {
        Self::Sample {
            data: None,
            end_of_stream: true,
        }
    }
}
