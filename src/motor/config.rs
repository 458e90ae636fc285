use std::{path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    axis::kind::AxisKind,
    units::{Unit, UnitError},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Poll interval must be at least 1 ms")]
    ZeroPollInterval,
    #[error(transparent)]
    Unit(#[from] UnitError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub kind: AxisKind,
    /// Unit the device reports positions in. Defaults to the kind's unit.
    pub unit: Option<Unit>,
    pub poll_interval_ms: u64,
    /// Reject targets outside the device travel range before moving.
    pub enforce_travel_bounds: bool,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            kind: AxisKind::Linear,
            unit: None,
            poll_interval_ms: 100,
            enforce_travel_bounds: false,
        }
    }
}

impl MotorConfig {
    pub fn new(kind: AxisKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Rounds up to whole milliseconds, with 1 ms as the floor.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        let millis = interval.as_micros().div_ceil(1000).max(1);
        self.poll_interval_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    pub fn with_travel_bounds(mut self, enforce: bool) -> Self {
        self.enforce_travel_bounds = enforce;
        self
    }

    pub fn unit(&self) -> Unit {
        self.unit.unwrap_or_else(|| self.kind.default_unit())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = self.unit();
        if !self.kind.accepts(unit) {
            return Err(UnitError::WrongDimension {
                unit,
                expected: self.kind.dimension(),
            }
            .into());
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read motor config {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("Invalid motor config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Dimension;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = MotorConfig::default();
        assert_eq!(config.unit(), Unit::Millimeter);
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(MotorConfig::new(AxisKind::Rotary).unit(), Unit::Degree);
    }

    #[test]
    fn test_parse_partial_json() {
        let config = MotorConfig::from_json_str(r#"{"kind": "rotary", "unit": "rad"}"#).unwrap();
        assert_eq!(config.kind, AxisKind::Rotary);
        assert_eq!(config.unit(), Unit::Radian);
        assert_eq!(config.poll_interval_ms, 100);
        assert!(!config.enforce_travel_bounds);
    }

    #[test]
    fn test_unit_must_match_kind() {
        let config = MotorConfig::new(AxisKind::Linear).with_unit(Unit::Degree);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Unit(UnitError::WrongDimension {
                unit: Unit::Degree,
                expected: Dimension::Length
            }))
        );
    }

    #[test]
    fn test_sub_millisecond_interval_rounds_up() {
        let config = MotorConfig::default().with_poll_interval(Duration::from_micros(500));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));

        let config = MotorConfig::default().with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));

        let config = MotorConfig::default().with_poll_interval(Duration::from_micros(2500));
        assert_eq!(config.poll_interval(), Duration::from_millis(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let config = MotorConfig::from_json_str(r#"{"poll_interval_ms": 0}"#).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"poll_interval_ms": 0}}"#).unwrap();
        assert!(MotorConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"kind": "linear", "unit": "um", "poll_interval_ms": 20, "enforce_travel_bounds": true}}"#
        )
        .unwrap();

        let config = MotorConfig::load(file.path()).unwrap();
        assert_eq!(config.unit(), Unit::Micrometer);
        assert_eq!(config.poll_interval(), Duration::from_millis(20));
        assert!(config.enforce_travel_bounds);
    }

    #[test]
    fn test_load_rejects_wrong_dimension() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"kind": "rotary", "unit": "mm"}}"#).unwrap();
        assert!(MotorConfig::load(file.path()).is_err());
    }
}
