pub mod axis;
pub mod device;
pub mod error;
pub mod motor;
pub mod units;

pub use axis::{kind::AxisKind, state::AxisState, Axis};
pub use device::{simulated::SimulatedDevice, RemoteDevice};
pub use error::{MotorError, Result};
pub use motor::{config::MotorConfig, session::Session, Motor};
pub use units::{Quantity, Unit};
