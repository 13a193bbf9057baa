//! Maintain and reconcile the shoot.

use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::crd::ShootOperation;
use crate::framework::error::Result;
use crate::framework::lifecycle::ShootLifecycle;
use crate::scenarios::{Verdict, within_deadline};

const SCENARIO: &str = "reconcile";

/// Trigger a maintenance run and then a plain reconciliation, waiting for
/// each to succeed.
pub async fn maintain_and_reconcile<L: ShootLifecycle>(
    lifecycle: &mut L,
    timeout: Duration,
) -> Result<Verdict> {
    let deadline = Instant::now() + timeout;
    within_deadline(SCENARIO, deadline, timeout, async {
        for operation in [ShootOperation::Maintain, ShootOperation::Reconcile] {
            info!(operation = %operation, "Annotating shoot");
            lifecycle
                .update_shoot(|shoot| shoot.set_operation(operation))
                .await?;
            info!(operation = %operation, "Shoot operation succeeded");
        }
        Ok(Verdict::Passed)
    })
    .await
}
