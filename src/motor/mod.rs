//! Motion control of a single axis driven by a remote motor device.
//!
//! A [`Motor`] turns raw device state and limit switches into an
//! [`AxisState`], sequences moves as write-then-poll and stops the axis
//! whenever a wait for motion is cancelled. It does not serialize callers
//! itself; use [`Motor::session`] for that.

pub mod config;
pub mod session;

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, OnceCell},
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    axis::{
        kind::AxisKind, limit_switches::LimitSwitches, state::AxisState, status::AxisStatus, Axis,
    },
    device::{
        AttributeValue, RemoteDevice, CCW_LIMIT, CW_LIMIT, MOVE_HOME, POSITION, STOP_MOVE,
        UNIT_LIMIT_MAX, UNIT_LIMIT_MIN,
    },
    error::{MotorError, Result},
    units::{Quantity, Unit},
};
use config::MotorConfig;
use session::Session;

pub struct Motor {
    device: Arc<dyn RemoteDevice>,
    kind: AxisKind,
    unit: Unit,
    poll_interval: Duration,
    enforce_travel_bounds: bool,
    // Travel bounds are static on the device, read at most once each.
    lower_limit: OnceCell<Quantity>,
    upper_limit: OnceCell<Quantity>,
    guard: Mutex<()>,
}

impl Motor {
    /// Binds a motor to `device`, failing if the device does not answer.
    pub async fn bind(device: Arc<dyn RemoteDevice>, config: MotorConfig) -> Result<Self> {
        config.validate()?;

        let latency = device
            .ping()
            .await
            .map_err(|source| MotorError::Unreachable {
                device: device.name().to_string(),
                source,
            })?;

        info!(
            "Bound {:?} axis to {} (unit {}, ping {:?})",
            config.kind,
            device.name(),
            config.unit(),
            latency
        );

        Ok(Self {
            device,
            kind: config.kind,
            unit: config.unit(),
            poll_interval: config.poll_interval(),
            enforce_travel_bounds: config.enforce_travel_bounds,
            lower_limit: OnceCell::new(),
            upper_limit: OnceCell::new(),
            guard: Mutex::new(()),
        })
    }

    pub async fn linear(device: Arc<dyn RemoteDevice>) -> Result<Self> {
        Self::bind(device, MotorConfig::new(AxisKind::Linear)).await
    }

    pub async fn rotary(device: Arc<dyn RemoteDevice>) -> Result<Self> {
        Self::bind(device, MotorConfig::new(AxisKind::Rotary)).await
    }

    pub fn name(&self) -> &str {
        self.device.name()
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub async fn session(&self) -> Result<Session<'_>> {
        Session::open(self).await
    }

    pub async fn limit_switches(&self) -> Result<LimitSwitches> {
        let backward = self.device.read_bool(CW_LIMIT).await?;
        let forward = self.device.read_bool(CCW_LIMIT).await?;
        Ok(LimitSwitches::from_flags(backward, forward))
    }

    pub async fn in_hard_limit(&self) -> Result<bool> {
        Ok(self.limit_switches().await?.any_active())
    }

    pub async fn lower_limit(&self) -> Result<Quantity> {
        self.lower_limit
            .get_or_try_init(|| self.fetch_limit(UNIT_LIMIT_MIN))
            .await
            .copied()
    }

    pub async fn upper_limit(&self) -> Result<Quantity> {
        self.upper_limit
            .get_or_try_init(|| self.fetch_limit(UNIT_LIMIT_MAX))
            .await
            .copied()
    }

    pub async fn travel_range(&self) -> Result<(Quantity, Quantity)> {
        Ok((self.lower_limit().await?, self.upper_limit().await?))
    }

    async fn fetch_limit(&self, attribute: &str) -> Result<Quantity> {
        let value = self.device.read_f64(attribute).await?;
        debug!("{}: {} = {} {}", self.name(), attribute, value, self.unit);
        Ok(Quantity::new(value, self.unit))
    }

    /// Limit switches win over whatever the device reports; the device is
    /// only asked for its state when both switches are clear.
    pub async fn current_state(&self) -> Result<AxisState> {
        if self.in_hard_limit().await? {
            return Ok(AxisState::HardLimit);
        }
        AxisState::try_from(self.device.state().await?)
    }

    pub async fn status(&self) -> Result<AxisStatus> {
        let limit_switches = self.limit_switches().await?;
        let state = if limit_switches.any_active() {
            AxisState::HardLimit
        } else {
            AxisState::try_from(self.device.state().await?)?
        };
        let position = self.get_position().await?;
        Ok(AxisStatus::new(state, position).with_limit_switches(limit_switches))
    }

    pub async fn get_position(&self) -> Result<Quantity> {
        let value = self.device.read_f64(POSITION).await?;
        Ok(Quantity::new(value, self.unit))
    }

    pub async fn set_position(&self, target: Quantity) -> Result<()> {
        self.set_position_cancellable(target, &CancellationToken::new())
            .await
    }

    /// Moves to `target` and waits for the axis to stop.
    ///
    /// Fails with [`MotorError::HardLimit`] if the move ended on a limit
    /// switch. If `cancel` fires while waiting, the axis is stopped before
    /// [`MotorError::Cancelled`] is returned. Dropping the future while the
    /// axis moves (e.g. under `tokio::time::timeout`) sends a stop command
    /// from a spawned task.
    pub async fn set_position_cancellable(
        &self,
        target: Quantity,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let native = target.to(self.unit)?;
        if self.enforce_travel_bounds {
            self.check_travel_range(native).await?;
        }

        info!("Moving {} to {}", self.name(), native);
        self.device
            .write_attribute(POSITION, AttributeValue::Double(native.magnitude()))
            .await?;
        self.wait_or_stop(cancel).await?;

        if self.in_hard_limit().await? {
            warn!("{} stopped in a hard limit short of {}", self.name(), native);
            return Err(MotorError::HardLimit { requested: target });
        }
        debug!("{} reached {}", self.name(), native);
        Ok(())
    }

    async fn check_travel_range(&self, target: Quantity) -> Result<()> {
        let (lower, upper) = self.travel_range().await?;
        if !(lower.magnitude()..=upper.magnitude()).contains(&target.magnitude()) {
            return Err(MotorError::OutOfRange {
                target,
                lower,
                upper,
            });
        }
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        debug!("Stopping {}", self.name());
        self.device.command(STOP_MOVE).await?;
        self.wait_for_stop().await?;
        Ok(())
    }

    pub async fn home(&self) -> Result<()> {
        self.home_cancellable(&CancellationToken::new()).await
    }

    pub async fn home_cancellable(&self, cancel: &CancellationToken) -> Result<()> {
        info!("Homing {}", self.name());
        self.device.command(MOVE_HOME).await?;
        self.wait_or_stop(cancel).await
    }

    /// Polls until the axis is no longer moving and returns the state it
    /// settled in. There is no timeout; cancel the caller to give up.
    pub async fn wait_for_stop(&self) -> Result<AxisState> {
        sleep(self.poll_interval).await;
        loop {
            let state = self.current_state().await?;
            if state != AxisState::Moving {
                return Ok(state);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn wait_or_stop(&self, cancel: &CancellationToken) -> Result<()> {
        let guard = StopOnDrop::arm(self.device.clone());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                guard.disarm();
                warn!("Motion of {} cancelled, stopping axis", self.name());
                self.stop().await?;
                Err(MotorError::Cancelled)
            }
            state = self.wait_for_stop() => {
                guard.disarm();
                debug!("{} settled in {}", self.name(), state?);
                Ok(())
            }
        }
    }
}

/// Stops the device if a wait for motion is dropped before it finishes.
struct StopOnDrop {
    device: Option<Arc<dyn RemoteDevice>>,
}

impl StopOnDrop {
    fn arm(device: Arc<dyn RemoteDevice>) -> Self {
        Self {
            device: Some(device),
        }
    }

    fn disarm(mut self) {
        self.device = None;
    }
}

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        let Some(device) = self.device.take() else {
            return;
        };
        warn!("Wait on {} dropped while moving, stopping axis", device.name());
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = device.command(STOP_MOVE).await {
                        warn!("Failed to stop {}: {}", device.name(), e);
                    }
                });
            }
            Err(_) => warn!("No runtime left to stop {}", device.name()),
        }
    }
}

#[async_trait::async_trait]
impl Axis for Motor {
    fn name(&self) -> &str {
        Motor::name(self)
    }

    fn kind(&self) -> AxisKind {
        self.kind
    }

    async fn get_state(&self) -> Result<AxisState> {
        self.current_state().await
    }

    async fn get_position(&self) -> Result<Quantity> {
        Motor::get_position(self).await
    }

    async fn set_position_cancellable(
        &self,
        target: Quantity,
        cancel: &CancellationToken,
    ) -> Result<()> {
        Motor::set_position_cancellable(self, target, cancel).await
    }

    async fn home_cancellable(&self, cancel: &CancellationToken) -> Result<()> {
        Motor::home_cancellable(self, cancel).await
    }

    async fn stop(&self) -> Result<()> {
        Motor::stop(self).await
    }

    async fn lower_limit(&self) -> Result<Quantity> {
        Motor::lower_limit(self).await
    }

    async fn upper_limit(&self) -> Result<Quantity> {
        Motor::upper_limit(self).await
    }
}
