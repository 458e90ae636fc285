use serde::{Deserialize, Serialize};

use crate::units::{Dimension, Unit};

/// Whether an axis translates or rotates. This is the only thing that
/// differs between a linear and a rotation motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    #[default]
    Linear,
    Rotary,
}

impl AxisKind {
    pub fn dimension(&self) -> Dimension {
        match self {
            AxisKind::Linear => Dimension::Length,
            AxisKind::Rotary => Dimension::Angle,
        }
    }

    pub fn default_unit(&self) -> Unit {
        match self {
            AxisKind::Linear => Unit::Millimeter,
            AxisKind::Rotary => Unit::Degree,
        }
    }

    pub fn accepts(&self, unit: Unit) -> bool {
        unit.dimension() == self.dimension()
    }
}
