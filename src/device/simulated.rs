//! In-memory motor device.
//!
//! A write to `position` starts a move that reports `MOVING` for a
//! configurable number of state queries before settling in `ON`. Targets
//! beyond the travel range are clamped and trip the matching limit switch.
//! Every round trip is counted so callers can check how often the device
//! was actually contacted.

use std::{collections::HashMap, collections::VecDeque, fmt, time::Duration};

use parking_lot::Mutex;
use tracing::trace;

use super::{
    AttributeValue, DevState, DeviceError, RemoteDevice, CCW_LIMIT, CW_LIMIT, MOVE_HOME, POSITION,
    STOP_MOVE, UNIT_LIMIT_MAX, UNIT_LIMIT_MIN,
};

#[derive(Debug)]
struct Inner {
    position: f64,
    limit_min: f64,
    limit_max: f64,
    cw_limit: bool,
    ccw_limit: bool,
    state: DevState,
    // None: a move never completes on its own, only StopMove ends it.
    travel_polls: Option<u32>,
    polls_left: Option<u32>,
    scripted_states: VecDeque<DevState>,
    online: bool,
    lock_depth: u32,
    foreign_lock: bool,
    reads: HashMap<String, usize>,
    writes: HashMap<String, usize>,
    commands: HashMap<String, usize>,
    state_queries: usize,
}

type UnlockHook = Box<dyn Fn() + Send + Sync>;

pub struct SimulatedDevice {
    name: String,
    inner: Mutex<Inner>,
    unlock_hook: Mutex<Option<UnlockHook>>,
}

impl fmt::Debug for SimulatedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedDevice")
            .field("name", &self.name)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl SimulatedDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(Inner {
                position: 0.0,
                limit_min: -100.0,
                limit_max: 100.0,
                cw_limit: false,
                ccw_limit: false,
                state: DevState::On,
                travel_polls: Some(1),
                polls_left: None,
                scripted_states: VecDeque::new(),
                online: true,
                lock_depth: 0,
                foreign_lock: false,
                reads: HashMap::new(),
                writes: HashMap::new(),
                commands: HashMap::new(),
                state_queries: 0,
            }),
            unlock_hook: Mutex::new(None),
        }
    }

    pub fn with_travel_range(self, min: f64, max: f64) -> Self {
        {
            let mut inner = self.inner.lock();
            inner.limit_min = min;
            inner.limit_max = max;
        }
        self
    }

    pub fn with_position(self, position: f64) -> Self {
        self.inner.lock().position = position;
        self
    }

    /// Number of state queries a move keeps reporting `MOVING`.
    pub fn with_travel_polls(self, polls: Option<u32>) -> Self {
        self.inner.lock().travel_polls = polls;
        self
    }

    pub fn set_state(&self, state: DevState) {
        let mut inner = self.inner.lock();
        inner.state = state;
        inner.polls_left = if state == DevState::Moving {
            inner.travel_polls
        } else {
            None
        };
    }

    /// States returned by the next state queries, ahead of the motion model.
    pub fn script_states(&self, states: impl IntoIterator<Item = DevState>) {
        self.inner.lock().scripted_states.extend(states);
    }

    pub fn set_limit_switches(&self, backward: bool, forward: bool) {
        let mut inner = self.inner.lock();
        inner.cw_limit = backward;
        inner.ccw_limit = forward;
    }

    pub fn set_online(&self, online: bool) {
        self.inner.lock().online = online;
    }

    pub fn set_foreign_lock(&self, locked: bool) {
        self.inner.lock().foreign_lock = locked;
    }

    /// Runs `hook` every time the device lock is released.
    pub fn on_unlock(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.unlock_hook.lock() = Some(Box::new(hook));
    }

    pub fn position(&self) -> f64 {
        self.inner.lock().position
    }

    pub fn is_locked(&self) -> bool {
        self.inner.lock().lock_depth > 0
    }

    pub fn reads(&self, attribute: &str) -> usize {
        self.inner.lock().reads.get(attribute).copied().unwrap_or(0)
    }

    pub fn writes(&self, attribute: &str) -> usize {
        self.inner.lock().writes.get(attribute).copied().unwrap_or(0)
    }

    pub fn commands(&self, command: &str) -> usize {
        self.inner.lock().commands.get(command).copied().unwrap_or(0)
    }

    pub fn state_queries(&self) -> usize {
        self.inner.lock().state_queries
    }

    fn check_online(&self, inner: &Inner) -> Result<(), DeviceError> {
        if inner.online {
            Ok(())
        } else {
            Err(DeviceError::ConnectionLost(self.name.clone()))
        }
    }

    fn start_move(inner: &mut Inner, target: f64) {
        inner.cw_limit = false;
        inner.ccw_limit = false;
        if target > inner.limit_max {
            inner.position = inner.limit_max;
            inner.ccw_limit = true;
        } else if target < inner.limit_min {
            inner.position = inner.limit_min;
            inner.cw_limit = true;
        } else {
            inner.position = target;
        }
        inner.state = DevState::Moving;
        inner.polls_left = inner.travel_polls;
    }
}

#[async_trait::async_trait]
impl RemoteDevice for SimulatedDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_attribute(&self, name: &str) -> Result<AttributeValue, DeviceError> {
        let mut inner = self.inner.lock();
        self.check_online(&inner)?;
        let value = match name {
            POSITION => AttributeValue::Double(inner.position),
            CW_LIMIT => AttributeValue::Bool(inner.cw_limit),
            CCW_LIMIT => AttributeValue::Bool(inner.ccw_limit),
            UNIT_LIMIT_MIN => AttributeValue::Double(inner.limit_min),
            UNIT_LIMIT_MAX => AttributeValue::Double(inner.limit_max),
            _ => return Err(DeviceError::UnknownAttribute(name.to_string())),
        };
        *inner.reads.entry(name.to_string()).or_default() += 1;
        trace!("{}: read {} = {:?}", self.name, name, value);
        Ok(value)
    }

    async fn write_attribute(&self, name: &str, value: AttributeValue) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        self.check_online(&inner)?;
        if name != POSITION {
            return Err(DeviceError::UnknownAttribute(name.to_string()));
        }
        let target = value.as_f64(name)?;
        *inner.writes.entry(name.to_string()).or_default() += 1;
        trace!("{}: write {} = {}", self.name, name, target);
        Self::start_move(&mut inner, target);
        Ok(())
    }

    async fn command(&self, name: &str) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        self.check_online(&inner)?;
        match name {
            STOP_MOVE => {
                inner.state = DevState::On;
                inner.polls_left = None;
            }
            MOVE_HOME => Self::start_move(&mut inner, 0.0),
            _ => return Err(DeviceError::UnknownCommand(name.to_string())),
        }
        *inner.commands.entry(name.to_string()).or_default() += 1;
        trace!("{}: command {}", self.name, name);
        Ok(())
    }

    async fn state(&self) -> Result<DevState, DeviceError> {
        let mut inner = self.inner.lock();
        self.check_online(&inner)?;
        inner.state_queries += 1;
        if let Some(state) = inner.scripted_states.pop_front() {
            return Ok(state);
        }
        if inner.state == DevState::Moving {
            match inner.polls_left {
                Some(0) => {
                    inner.state = DevState::On;
                    inner.polls_left = None;
                }
                Some(n) => inner.polls_left = Some(n - 1),
                None => {}
            }
        }
        Ok(inner.state)
    }

    async fn ping(&self) -> Result<Duration, DeviceError> {
        let inner = self.inner.lock();
        self.check_online(&inner)?;
        Ok(Duration::ZERO)
    }

    fn lock(&self) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        self.check_online(&inner)?;
        if inner.foreign_lock {
            return Err(DeviceError::Locked(self.name.clone()));
        }
        inner.lock_depth += 1;
        Ok(())
    }

    fn unlock(&self) -> Result<(), DeviceError> {
        {
            let mut inner = self.inner.lock();
            if inner.lock_depth == 0 {
                return Err(DeviceError::NotLocked(self.name.clone()));
            }
            inner.lock_depth -= 1;
        }
        if let Some(hook) = self.unlock_hook.lock().as_ref() {
            hook();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_move_reports_moving_for_travel_polls() {
        let device = SimulatedDevice::new("sim/motor/1").with_travel_polls(Some(2));
        device
            .write_attribute(POSITION, AttributeValue::Double(10.0))
            .await
            .unwrap();

        assert_eq!(device.state().await.unwrap(), DevState::Moving);
        assert_eq!(device.state().await.unwrap(), DevState::Moving);
        assert_eq!(device.state().await.unwrap(), DevState::On);
        assert_eq!(device.position(), 10.0);
        assert_eq!(device.writes(POSITION), 1);
    }

    #[tokio::test]
    async fn test_target_beyond_range_trips_limit() {
        let device = SimulatedDevice::new("sim/motor/1").with_travel_range(-5.0, 5.0);
        device
            .write_attribute(POSITION, AttributeValue::Double(8.0))
            .await
            .unwrap();

        assert_eq!(device.position(), 5.0);
        assert!(device.read_bool(CCW_LIMIT).await.unwrap());
        assert!(!device.read_bool(CW_LIMIT).await.unwrap());
    }

    #[tokio::test]
    async fn test_stop_ends_endless_move() {
        let device = SimulatedDevice::new("sim/motor/1").with_travel_polls(None);
        device.command(MOVE_HOME).await.unwrap();
        for _ in 0..10 {
            assert_eq!(device.state().await.unwrap(), DevState::Moving);
        }
        device.command(STOP_MOVE).await.unwrap();
        assert_eq!(device.state().await.unwrap(), DevState::On);
    }

    #[tokio::test]
    async fn test_offline_device_fails_round_trips() {
        let device = SimulatedDevice::new("sim/motor/1");
        device.set_online(false);

        assert!(matches!(
            device.ping().await,
            Err(DeviceError::ConnectionLost(_))
        ));
        assert!(matches!(
            device.read_attribute(POSITION).await,
            Err(DeviceError::ConnectionLost(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_names_are_rejected() {
        let device = SimulatedDevice::new("sim/motor/1");
        assert!(matches!(
            device.read_attribute("Velocity").await,
            Err(DeviceError::UnknownAttribute(_))
        ));
        assert!(matches!(
            device.command("Calibrate").await,
            Err(DeviceError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_lock_is_reentrant_for_own_client() {
        let device = SimulatedDevice::new("sim/motor/1");
        device.lock().unwrap();
        device.lock().unwrap();
        device.unlock().unwrap();
        assert!(device.is_locked());
        device.unlock().unwrap();
        assert!(!device.is_locked());
        assert!(device.unlock().is_err());

        device.set_foreign_lock(true);
        assert_eq!(
            device.lock(),
            Err(DeviceError::Locked("sim/motor/1".to_string()))
        );
    }

    #[test]
    fn test_unlock_hook_runs_on_release() {
        let device = SimulatedDevice::new("sim/motor/1");
        let released = std::sync::Arc::new(Mutex::new(0));
        let counter = released.clone();
        device.on_unlock(move || *counter.lock() += 1);

        device.lock().unwrap();
        device.unlock().unwrap();
        assert!(device.unlock().is_err());
        assert_eq!(*released.lock(), 1);
    }
}
