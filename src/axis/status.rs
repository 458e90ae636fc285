use serde::Serialize;

use super::limit_switches::LimitSwitches;
use super::state::AxisState;
use crate::units::Quantity;

/// Snapshot of an axis taken by [`crate::Motor::status`].
#[derive(Debug, Clone, Serialize)]
pub struct AxisStatus {
    pub state: AxisState,
    pub position: Quantity,
    pub limit_switches: LimitSwitches,
}

impl AxisStatus {
    pub fn new(state: AxisState, position: Quantity) -> Self {
        Self {
            state,
            position,
            limit_switches: LimitSwitches::None,
        }
    }

    pub fn with_limit_switches(mut self, limit_switches: LimitSwitches) -> Self {
        self.limit_switches = limit_switches;
        self
    }

    pub fn is_moving(&self) -> bool {
        self.state == AxisState::Moving
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self.state, AxisState::Alarm | AxisState::Fault)
    }

    pub fn is_ready(&self) -> bool {
        self.state == AxisState::Standby && !self.limit_switches.any_active()
    }
}
