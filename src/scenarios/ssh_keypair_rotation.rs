//! Rotate the SSH keypair of the shoot's worker nodes.

use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::crd::ShootOperation;
use crate::framework::error::{Error, Result};
use crate::framework::lifecycle::ShootLifecycle;
use crate::framework::secrets::{
    OLD_SSH_KEYPAIR_SECRET_SUFFIX, SSH_AUTHORIZED_KEYS_DATA_KEY, SSH_KEYPAIR_SECRET_SUFFIX,
    SSH_PRIVATE_KEY_DATA_KEY, SshKeypair, project_resource_name,
};
use crate::scenarios::{Verdict, within_deadline};

const SCENARIO: &str = "rotate-ssh-keypair";

async fn read_keypair<L: ShootLifecycle>(lifecycle: &L, secret_name: &str) -> Result<SshKeypair> {
    Ok(SshKeypair {
        private_key: lifecycle
            .secret_field(secret_name, SSH_PRIVATE_KEY_DATA_KEY)
            .await?,
        authorized_keys: lifecycle
            .secret_field(secret_name, SSH_AUTHORIZED_KEYS_DATA_KEY)
            .await?,
    })
}

/// Rotate the SSH keypair and check that a new pair was issued while the
/// previous one is kept in the `.old` secret.
pub async fn rotate_ssh_keypair<L: ShootLifecycle>(
    lifecycle: &mut L,
    timeout: Duration,
) -> Result<Verdict> {
    let deadline = Instant::now() + timeout;
    within_deadline(SCENARIO, deadline, timeout, rotate(lifecycle)).await
}

async fn rotate<L: ShootLifecycle>(lifecycle: &mut L) -> Result<Verdict> {
    let shoot_name = lifecycle.config().shoot_name.clone();
    let current_secret = project_resource_name(&shoot_name, SSH_KEYPAIR_SECRET_SUFFIX);
    let old_secret = project_resource_name(&shoot_name, OLD_SSH_KEYPAIR_SECRET_SUFFIX);

    let before = read_keypair(lifecycle, &current_secret).await?;

    info!("Rotating SSH keypair");
    lifecycle
        .update_shoot(|shoot| shoot.set_operation(ShootOperation::RotateSshKeypair))
        .await?;
    lifecycle.refresh_shoot().await?;

    if lifecycle.shoot().operation_annotation() == Some(ShootOperation::RotateSshKeypair.as_str())
    {
        return Err(Error::assertion(format!(
            "shoot still carries the {} operation annotation",
            ShootOperation::RotateSshKeypair
        )));
    }

    let after = read_keypair(lifecycle, &current_secret).await?;
    let previous = read_keypair(lifecycle, &old_secret).await?;

    if after.private_key == before.private_key {
        return Err(Error::assertion("SSH private key did not change after rotation"));
    }
    if after.authorized_keys == before.authorized_keys {
        return Err(Error::assertion("SSH public key did not change after rotation"));
    }
    if previous != before {
        return Err(Error::assertion(format!(
            "{} does not hold the keypair from before the rotation",
            old_secret
        )));
    }

    info!("SSH keypair rotated");
    Ok(Verdict::Passed)
}
