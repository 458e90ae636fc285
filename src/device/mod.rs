//! Contract of the remote motor device.
//!
//! The device exposes named attributes, a handful of commands, a coarse
//! state and a client-level lock. The transport behind it is not part of
//! this crate; [`simulated::SimulatedDevice`] implements it in memory.

pub mod error;
pub mod simulated;

use std::{fmt, time::Duration};

pub use error::DeviceError;

/// Position of the axis in the device unit.
pub const POSITION: &str = "position";
/// Backward limit switch.
pub const CW_LIMIT: &str = "CwLimit";
/// Forward limit switch.
pub const CCW_LIMIT: &str = "CcwLimit";
pub const UNIT_LIMIT_MIN: &str = "UnitLimitMin";
pub const UNIT_LIMIT_MAX: &str = "UnitLimitMax";

pub const STOP_MOVE: &str = "StopMove";
pub const MOVE_HOME: &str = "MoveHome";

/// Raw state as reported by the device server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevState {
    On,
    Off,
    Close,
    Open,
    Insert,
    Extract,
    Moving,
    Standby,
    Fault,
    Init,
    Running,
    Alarm,
    Disable,
    Unknown,
}

impl fmt::Display for DevState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DevState::On => "ON",
            DevState::Off => "OFF",
            DevState::Close => "CLOSE",
            DevState::Open => "OPEN",
            DevState::Insert => "INSERT",
            DevState::Extract => "EXTRACT",
            DevState::Moving => "MOVING",
            DevState::Standby => "STANDBY",
            DevState::Fault => "FAULT",
            DevState::Init => "INIT",
            DevState::Running => "RUNNING",
            DevState::Alarm => "ALARM",
            DevState::Disable => "DISABLE",
            DevState::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
}

impl AttributeValue {
    pub fn as_f64(&self, attribute: &str) -> Result<f64, DeviceError> {
        match self {
            AttributeValue::Double(v) => Ok(*v),
            AttributeValue::Long(v) => Ok(*v as f64),
            _ => Err(DeviceError::WrongType {
                attribute: attribute.to_string(),
                expected: "number",
            }),
        }
    }

    pub fn as_bool(&self, attribute: &str) -> Result<bool, DeviceError> {
        match self {
            AttributeValue::Bool(v) => Ok(*v),
            _ => Err(DeviceError::WrongType {
                attribute: attribute.to_string(),
                expected: "boolean",
            }),
        }
    }
}

/// Handle to one remote motor device.
///
/// Every async method is a round trip to the device. `lock`/`unlock` are
/// synchronous so that a lock can be released from `Drop`.
#[async_trait::async_trait]
pub trait RemoteDevice: Send + Sync {
    fn name(&self) -> &str;

    async fn read_attribute(&self, name: &str) -> Result<AttributeValue, DeviceError>;
    async fn write_attribute(&self, name: &str, value: AttributeValue) -> Result<(), DeviceError>;
    async fn command(&self, name: &str) -> Result<(), DeviceError>;
    async fn state(&self) -> Result<DevState, DeviceError>;

    /// Round-trip time to the device server.
    async fn ping(&self) -> Result<Duration, DeviceError>;

    fn lock(&self) -> Result<(), DeviceError>;
    fn unlock(&self) -> Result<(), DeviceError>;

    async fn read_f64(&self, name: &str) -> Result<f64, DeviceError> {
        self.read_attribute(name).await?.as_f64(name)
    }

    async fn read_bool(&self, name: &str) -> Result<bool, DeviceError> {
        self.read_attribute(name).await?.as_bool(name)
    }
}
