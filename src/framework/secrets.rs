//! Project secrets issued for a shoot.
//!
//! Gardener publishes per-shoot credentials in the project namespace as
//! `<shoot>.<suffix>` secrets.

use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;

use crate::framework::error::{Error, Result};

/// Suffix of the static token kubeconfig secret.
pub const KUBECONFIG_SECRET_SUFFIX: &str = "kubeconfig";
/// Suffix of the current worker SSH keypair secret.
pub const SSH_KEYPAIR_SECRET_SUFFIX: &str = "ssh-keypair";
/// Suffix of the secret holding the keypair replaced by the last rotation.
pub const OLD_SSH_KEYPAIR_SECRET_SUFFIX: &str = "ssh-keypair.old";

/// Data key of the kubeconfig.
pub const KUBECONFIG_DATA_KEY: &str = "kubeconfig";
/// Data key of the RSA private key.
pub const SSH_PRIVATE_KEY_DATA_KEY: &str = "id_rsa";
/// Data key of the authorized keys (public key) entry.
pub const SSH_AUTHORIZED_KEYS_DATA_KEY: &str = "id_rsa.pub";

/// Name of a project-scoped resource belonging to a shoot.
pub fn project_resource_name(shoot_name: &str, suffix: &str) -> String {
    format!("{}.{}", shoot_name, suffix)
}

/// Extract a non-empty data field from a secret.
pub fn secret_data(secret: &Secret, key: &str) -> Result<Vec<u8>> {
    let missing = || Error::MissingSecretData {
        secret: secret.metadata.name.clone().unwrap_or_default(),
        key: key.to_string(),
    };
    let value = secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .ok_or_else(missing)?;
    if value.0.is_empty() {
        return Err(missing());
    }
    Ok(value.0.clone())
}

/// Read one non-empty field of a named secret.
pub async fn get_secret_field(api: &Api<Secret>, name: &str, key: &str) -> Result<Vec<u8>> {
    let secret = api.get(name).await?;
    secret_data(&secret, key)
}

/// An SSH keypair as stored in the project secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct SshKeypair {
    pub private_key: Vec<u8>,
    pub authorized_keys: Vec<u8>,
}

// Key material never ends up in logs or assertion messages.
impl std::fmt::Debug for SshKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshKeypair")
            .field("private_key", &format_args!("<{} bytes>", self.private_key.len()))
            .field(
                "authorized_keys",
                &format_args!("<{} bytes>", self.authorized_keys.len()),
            )
            .finish()
    }
}
