pub mod kind;
pub mod limit_switches;
pub mod state;
pub mod status;

use tokio_util::sync::CancellationToken;

use crate::{error::Result, units::Quantity};
use kind::AxisKind;
use state::AxisState;

/// Unit-aware motor interface consumed by the control layer.
#[async_trait::async_trait]
pub trait Axis: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> AxisKind;

    async fn get_state(&self) -> Result<AxisState>;
    async fn get_position(&self) -> Result<Quantity>;

    /// Moves to `target` and returns once the axis has stopped. Cancelling
    /// `cancel` while the axis moves stops it before returning
    /// [`crate::MotorError::Cancelled`].
    async fn set_position_cancellable(
        &self,
        target: Quantity,
        cancel: &CancellationToken,
    ) -> Result<()>;
    async fn home_cancellable(&self, cancel: &CancellationToken) -> Result<()>;
    async fn stop(&self) -> Result<()>;

    async fn lower_limit(&self) -> Result<Quantity>;
    async fn upper_limit(&self) -> Result<Quantity>;

    async fn set_position(&self, target: Quantity) -> Result<()> {
        self.set_position_cancellable(target, &CancellationToken::new())
            .await
    }

    async fn home(&self) -> Result<()> {
        self.home_cancellable(&CancellationToken::new()).await
    }
}
