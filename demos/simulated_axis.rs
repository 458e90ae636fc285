use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tango_axis::{
    axis::kind::AxisKind, device::DevState, Motor, MotorConfig, MotorError, Quantity,
    SimulatedDevice, Unit,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let device = Arc::new(
        SimulatedDevice::new("sim/stage/x")
            .with_travel_range(-50.0, 50.0)
            .with_travel_polls(Some(5)),
    );

    let config = MotorConfig::new(AxisKind::Linear).with_poll_interval(Duration::from_millis(50));
    let motor = Motor::bind(device.clone(), config).await?;

    let (lower, upper) = motor.travel_range().await?;
    info!("Travel range of {}: [{}, {}]", motor.name(), lower, upper);

    {
        let session = motor.session().await?;

        session
            .set_position(Quantity::new(0.0125, Unit::Meter))
            .await?;
        info!("Position after move: {}", session.get_position().await?);

        match session.set_position(Quantity::new(80.0, Unit::Millimeter)).await {
            Err(MotorError::HardLimit { requested }) => {
                error!("Move to {} ended in a hard limit", requested);
            }
            other => other?,
        }
        info!(
            "Status: {}",
            serde_json::to_string(&session.status().await?)?
        );

        session.home().await?;
        info!("Position after homing: {}", session.get_position().await?);
    }

    let endless = Arc::new(SimulatedDevice::new("sim/stage/theta").with_travel_polls(None));
    let rotation = Motor::rotary(endless.clone()).await?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    match rotation
        .set_position_cancellable(Quantity::new(90.0, Unit::Degree), &cancel)
        .await
    {
        Err(MotorError::Cancelled) => {
            let state = rotation.current_state().await?;
            info!("Rotation cancelled, axis is {}", state);
        }
        other => other?,
    }

    endless.set_state(DevState::Init);
    if let Err(e) = rotation.current_state().await {
        error!("{}", e);
    }

    Ok(())
}
