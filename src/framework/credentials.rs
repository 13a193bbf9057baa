//! Clients built from raw kubeconfig bytes.
//!
//! Used to check whether an issued kubeconfig still authenticates and to hand
//! the rotated kubeconfig over to later test steps.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::info;

use crate::framework::error::{Error, Result};

/// File name of the exported shoot kubeconfig.
pub const SHOOT_KUBECONFIG_FILE: &str = "shoot.config";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Parse a kubeconfig document.
pub fn parse_kubeconfig(bytes: &[u8]) -> Result<Kubeconfig> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::Kubeconfig(format!("kubeconfig is not UTF-8: {}", e)))?;
    Kubeconfig::from_yaml(text).map_err(|e| Error::Kubeconfig(e.to_string()))
}

/// Build a client from raw kubeconfig bytes using its current context.
pub async fn client_from_kubeconfig_bytes(bytes: &[u8]) -> Result<Client> {
    let kubeconfig = parse_kubeconfig(bytes)?;
    let mut config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| Error::Kubeconfig(e.to_string()))?;
    config.connect_timeout = Some(CONNECT_TIMEOUT);
    config.read_timeout = Some(READ_TIMEOUT);
    Ok(Client::try_from(config)?)
}

/// Build a client from a kubeconfig file, or infer one from the environment.
pub async fn client_from_path(path: Option<&Path>) -> Result<Client> {
    match path {
        Some(path) => {
            let kubeconfig =
                Kubeconfig::read_from(path).map_err(|e| Error::Kubeconfig(e.to_string()))?;
            let config =
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| Error::Kubeconfig(e.to_string()))?;
            Ok(Client::try_from(config)?)
        }
        None => {
            let config = Config::infer()
                .await
                .map_err(|e| Error::Kubeconfig(e.to_string()))?;
            Ok(Client::try_from(config)?)
        }
    }
}

/// Probe the API server; succeeds only if the client's credentials are accepted.
pub async fn server_version(client: &Client) -> Result<String> {
    let info = client.apiserver_version().await?;
    Ok(info.git_version)
}

/// Write a kubeconfig to `<dir>/shoot.config`.
pub fn export_kubeconfig(dir: &Path, kubeconfig: &[u8]) -> Result<PathBuf> {
    let path = dir.join(SHOOT_KUBECONFIG_FILE);
    std::fs::write(&path, kubeconfig)?;
    info!(path = %path.display(), "Exported shoot kubeconfig");
    Ok(path)
}
