use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{device::DevState, error::MotorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisState {
    Standby,
    Moving,
    HardLimit,
    Fault,
    Disabled,
    Alarm,
}

impl AxisState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisState::Standby => "standby",
            AxisState::Moving => "moving",
            AxisState::HardLimit => "hard-limit",
            AxisState::Fault => "fault",
            AxisState::Disabled => "disabled",
            AxisState::Alarm => "alarm",
        }
    }
}

impl fmt::Display for AxisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps the device's own state. Limit switches are not considered here; a
/// `HardLimit` never comes out of this conversion.
impl TryFrom<DevState> for AxisState {
    type Error = MotorError;

    fn try_from(state: DevState) -> Result<Self, Self::Error> {
        match state {
            DevState::Moving => Ok(AxisState::Moving),
            DevState::On | DevState::Standby => Ok(AxisState::Standby),
            DevState::Fault => Ok(AxisState::Fault),
            DevState::Disable => Ok(AxisState::Disabled),
            DevState::Alarm => Ok(AxisState::Alarm),
            other => Err(MotorError::UnknownDeviceState(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_device_states() {
        let cases = [
            (DevState::Moving, AxisState::Moving),
            (DevState::On, AxisState::Standby),
            (DevState::Standby, AxisState::Standby),
            (DevState::Fault, AxisState::Fault),
            (DevState::Disable, AxisState::Disabled),
            (DevState::Alarm, AxisState::Alarm),
        ];
        for (raw, expected) in cases {
            assert_eq!(AxisState::try_from(raw).unwrap(), expected, "{}", raw);
        }
    }

    #[test]
    fn test_unknown_device_states() {
        for raw in [
            DevState::Off,
            DevState::Init,
            DevState::Running,
            DevState::Unknown,
            DevState::Open,
            DevState::Close,
            DevState::Insert,
            DevState::Extract,
        ] {
            assert!(matches!(
                AxisState::try_from(raw),
                Err(MotorError::UnknownDeviceState(s)) if s == raw
            ));
        }
    }
}
