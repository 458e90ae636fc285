use std::ops::Deref;

use tokio::sync::MutexGuard;
use tracing::{debug, warn};

use super::Motor;
use crate::{
    device::{DeviceError, RemoteDevice},
    error::Result,
};

/// Exclusive access to a [`Motor`].
///
/// Holds the device lock and the motor's in-process lock. Dropping the
/// session releases the in-process lock first, then the device lock.
pub struct Session<'a> {
    motor: &'a Motor,
    // Field order is release order.
    _local: MutexGuard<'a, ()>,
    _remote: RemoteLock<'a>,
}

impl<'a> Session<'a> {
    pub(super) async fn open(motor: &'a Motor) -> Result<Session<'a>> {
        let remote = RemoteLock::acquire(motor.device.as_ref())?;
        let local = motor.guard.lock().await;
        debug!("Opened exclusive session on {}", motor.name());
        Ok(Session {
            motor,
            _local: local,
            _remote: remote,
        })
    }
}

impl Deref for Session<'_> {
    type Target = Motor;

    fn deref(&self) -> &Motor {
        self.motor
    }
}

struct RemoteLock<'a> {
    device: &'a dyn RemoteDevice,
}

impl<'a> RemoteLock<'a> {
    fn acquire(device: &'a dyn RemoteDevice) -> Result<Self, DeviceError> {
        device.lock()?;
        Ok(Self { device })
    }
}

impl Drop for RemoteLock<'_> {
    fn drop(&mut self) {
        match self.device.unlock() {
            Ok(()) => debug!("Released lock on {}", self.device.name()),
            Err(e) => warn!("Failed to unlock {}: {}", self.device.name(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        device::simulated::SimulatedDevice,
        error::MotorError,
        motor::config::MotorConfig,
        units::{Quantity, Unit},
    };

    async fn motor(device: &Arc<SimulatedDevice>) -> Motor {
        let config = MotorConfig::default().with_poll_interval(Duration::from_millis(1));
        Motor::bind(device.clone(), config).await.unwrap()
    }

    #[tokio::test]
    async fn test_session_holds_device_lock() {
        let device = Arc::new(SimulatedDevice::new("sim/motor/1"));
        let motor = motor(&device).await;

        {
            let session = motor.session().await.unwrap();
            assert!(device.is_locked());
            session.stop().await.unwrap();
        }
        assert!(!device.is_locked());
    }

    #[tokio::test]
    async fn test_second_session_waits_for_first() {
        let device = Arc::new(SimulatedDevice::new("sim/motor/1"));
        let motor = Arc::new(motor(&device).await);

        let session = motor.session().await.unwrap();

        let contender_motor = motor.clone();
        let contender = tokio::spawn(async move {
            let _session = contender_motor.session().await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(session);
        contender.await.unwrap();
        assert!(!device.is_locked());
    }

    #[tokio::test]
    async fn test_foreign_lock_fails_without_taking_local_lock() {
        let device = Arc::new(SimulatedDevice::new("sim/motor/1"));
        let motor = motor(&device).await;

        device.set_foreign_lock(true);
        let err = motor.session().await.err().unwrap();
        assert!(matches!(err, MotorError::Device(DeviceError::Locked(_))));

        device.set_foreign_lock(false);
        let session = tokio::time::timeout(Duration::from_millis(100), motor.session())
            .await
            .unwrap();
        assert!(session.is_ok());
    }

    #[tokio::test]
    async fn test_local_lock_released_before_device_lock() {
        let device = Arc::new(SimulatedDevice::new("sim/motor/1"));
        let motor = Arc::new(motor(&device).await);

        let local_free_at_unlock = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let observed = local_free_at_unlock.clone();
        let observed_motor = Arc::downgrade(&motor);
        device.on_unlock(move || {
            if let Some(motor) = observed_motor.upgrade() {
                observed.lock().push(motor.guard.try_lock().is_ok());
            }
        });

        drop(motor.session().await.unwrap());
        assert_eq!(*local_free_at_unlock.lock(), vec![true]);
    }

    #[tokio::test]
    async fn test_locks_released_when_session_body_fails() {
        let device = Arc::new(SimulatedDevice::new("sim/motor/1"));
        let motor = motor(&device).await;

        let result: Result<()> = async {
            let session = motor.session().await?;
            device.set_online(false);
            session.set_position(Quantity::new(1.0, Unit::Millimeter)).await?;
            Ok(())
        }
        .await;

        assert!(matches!(
            result,
            Err(MotorError::Device(DeviceError::ConnectionLost(_)))
        ));
        assert!(!device.is_locked());
        assert!(motor.guard.try_lock().is_ok());
    }
}
