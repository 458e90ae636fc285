use serde::{Deserialize, Serialize};

/// Hard-limit switches of an axis. `Backward` is the device's `CwLimit`,
/// `Forward` its `CcwLimit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitSwitches {
    None,
    Backward,
    Forward,
    Both,
}

impl LimitSwitches {
    pub fn from_flags(backward: bool, forward: bool) -> Self {
        match (backward, forward) {
            (false, false) => LimitSwitches::None,
            (true, false) => LimitSwitches::Backward,
            (false, true) => LimitSwitches::Forward,
            (true, true) => LimitSwitches::Both,
        }
    }

    pub fn has_forward(&self) -> bool {
        matches!(self, LimitSwitches::Forward | LimitSwitches::Both)
    }

    pub fn has_backward(&self) -> bool {
        matches!(self, LimitSwitches::Backward | LimitSwitches::Both)
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, LimitSwitches::None)
    }

    pub fn any_active(&self) -> bool {
        !self.is_clear()
    }
}
