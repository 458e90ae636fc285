use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("Timeout during {0}")]
    Timeout(String),
    #[error("Connection to {0} lost")]
    ConnectionLost(String),
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Attribute {attribute} is not a {expected}")]
    WrongType {
        attribute: String,
        expected: &'static str,
    },
    #[error("Device {0} is locked by another client")]
    Locked(String),
    #[error("Device {0} is not locked")]
    NotLocked(String),
}
