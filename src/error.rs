use thiserror::Error;

use crate::{
    device::{DevState, DeviceError},
    motor::config::ConfigError,
    units::{Quantity, UnitError},
};

#[derive(Debug, Error)]
pub enum MotorError {
    #[error("Unknown device state '{0}'")]
    UnknownDeviceState(DevState),

    /// The move ran but ended on a limit switch, so `requested` was not reached.
    #[error("Axis stopped in a hard limit while moving to {requested}")]
    HardLimit { requested: Quantity },

    #[error("Motion cancelled, axis stopped")]
    Cancelled,

    #[error("Target {target} outside travel range [{lower}, {upper}]")]
    OutOfRange {
        target: Quantity,
        lower: Quantity,
        upper: Quantity,
    },

    #[error("Device {device} is not reachable")]
    Unreachable {
        device: String,
        #[source]
        source: DeviceError,
    },

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("Invalid motor config: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T, E = MotorError> = std::result::Result<T, E>;
