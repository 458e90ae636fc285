//! Physical quantities with a unit attached.
//!
//! Positions travel through the motor layer as [`Quantity`] values so that a
//! caller may ask for a move in metres while the device works in millimetres.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Length,
    Angle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "um")]
    Micrometer,
    #[serde(rename = "deg")]
    Degree,
    #[serde(rename = "rad")]
    Radian,
}

impl Unit {
    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Meter | Unit::Millimeter | Unit::Micrometer => Dimension::Length,
            Unit::Degree | Unit::Radian => Dimension::Angle,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Meter => "m",
            Unit::Millimeter => "mm",
            Unit::Micrometer => "um",
            Unit::Degree => "deg",
            Unit::Radian => "rad",
        }
    }

    /// Scale to the SI base unit of the dimension (metre or radian).
    fn scale(&self) -> f64 {
        match self {
            Unit::Meter => 1.0,
            Unit::Millimeter => 1e-3,
            Unit::Micrometer => 1e-6,
            Unit::Degree => std::f64::consts::PI / 180.0,
            Unit::Radian => 1.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("cannot convert {from} to {to}: incompatible dimensions")]
    Incompatible { from: Unit, to: Unit },
    #[error("{unit} is not a unit of {expected:?}")]
    WrongDimension { unit: Unit, expected: Dimension },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    magnitude: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn to(&self, unit: Unit) -> Result<Quantity, UnitError> {
        if self.unit == unit {
            return Ok(*self);
        }
        if self.unit.dimension() != unit.dimension() {
            return Err(UnitError::Incompatible {
                from: self.unit,
                to: unit,
            });
        }
        Ok(Quantity::new(
            self.magnitude * self.unit.scale() / unit.scale(),
            unit,
        ))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}
