//! Rotate the static token kubeconfig of the shoot.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::crd::ShootOperation;
use crate::framework::credentials::export_kubeconfig;
use crate::framework::error::{Error, Result};
use crate::framework::lifecycle::ShootLifecycle;
use crate::framework::secrets::{
    KUBECONFIG_DATA_KEY, KUBECONFIG_SECRET_SUFFIX, project_resource_name,
};
use crate::scenarios::{Verdict, within_deadline};

const SCENARIO: &str = "rotate-kubeconfig";

/// Rotate the static token kubeconfig and check that only the new one is
/// accepted afterwards.
///
/// Skipped when the shoot has no static token kubeconfig. The new
/// kubeconfig is exported as soon as it has been read when an export
/// directory is configured.
pub async fn rotate_kubeconfig<L: ShootLifecycle>(
    lifecycle: &mut L,
    timeout: Duration,
) -> Result<Verdict> {
    let deadline = Instant::now() + timeout;
    within_deadline(SCENARIO, deadline, timeout, rotate(lifecycle)).await
}

async fn rotate<L: ShootLifecycle>(lifecycle: &mut L) -> Result<Verdict> {
    lifecycle.refresh_shoot().await?;
    if !lifecycle.shoot().static_token_kubeconfig_enabled() {
        info!("Static token kubeconfig is disabled, skipping");
        return Ok(Verdict::Skipped(
            "static token kubeconfig is not enabled".to_string(),
        ));
    }

    let secret_name =
        project_resource_name(&lifecycle.config().shoot_name, KUBECONFIG_SECRET_SUFFIX);

    let old_kubeconfig = lifecycle
        .secret_field(&secret_name, KUBECONFIG_DATA_KEY)
        .await?;
    let old_client = lifecycle.credential_client(&old_kubeconfig).await?;
    let version = lifecycle.server_version(&old_client).await?;
    info!(version = %version, "Current kubeconfig authenticates");

    info!("Rotating kubeconfig credentials");
    lifecycle
        .update_shoot(|shoot| shoot.set_operation(ShootOperation::RotateKubeconfigCredentials))
        .await?;
    lifecycle.refresh_shoot().await?;

    let rotation = lifecycle
        .shoot()
        .kubeconfig_rotation()
        .ok_or_else(|| Error::assertion("kubeconfig rotation status is missing"))?;
    let initiated = rotation
        .initiated_at()
        .ok_or_else(|| Error::assertion("kubeconfig rotation has no initiation time"))?;
    let completed = rotation
        .completed_at()
        .ok_or_else(|| Error::assertion("kubeconfig rotation has no completion time"))?;
    if completed < initiated {
        return Err(Error::assertion(format!(
            "kubeconfig rotation completed at {} before it was initiated at {}",
            completed, initiated
        )));
    }

    let new_kubeconfig = lifecycle
        .secret_field(&secret_name, KUBECONFIG_DATA_KEY)
        .await?;
    if let Some(dir) = lifecycle.config().kubeconfigs_path.as_deref() {
        export_kubeconfig(dir, &new_kubeconfig)?;
    }

    if new_kubeconfig == old_kubeconfig {
        return Err(Error::assertion("kubeconfig did not change after rotation"));
    }

    let new_client = lifecycle.credential_client(&new_kubeconfig).await?;
    let version = lifecycle.server_version(&new_client).await?;
    info!(version = %version, "Rotated kubeconfig authenticates");

    match lifecycle.server_version(&old_client).await {
        Ok(_) => {
            return Err(Error::assertion(
                "old kubeconfig still authenticates after rotation",
            ));
        }
        Err(e) => debug!(error = %e, "Old kubeconfig rejected"),
    }

    Ok(Verdict::Passed)
}
