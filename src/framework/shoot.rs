//! Shoot framework backed by a live garden cluster.
//!
//! `ShootFramework` is the cluster handle the scenarios run against. It owns
//! the garden client, keeps the last observed `Shoot`, and implements the
//! lifecycle contract with merge patches plus watch-based waits.

use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use tracing::{info, warn};

use crate::crd::{Shoot, ShootOperation};
use crate::framework::config::FrameworkConfig;
use crate::framework::credentials::{client_from_kubeconfig_bytes, client_from_path, server_version};
use crate::framework::error::{Error, Result};
use crate::framework::lifecycle::ShootLifecycle;
use crate::framework::patch::shoot_patch;
use crate::framework::secrets::{
    KUBECONFIG_DATA_KEY, KUBECONFIG_SECRET_SUFFIX, get_secret_field, project_resource_name,
};
use crate::framework::wait::{ShootExpectation, hibernation_reached, wait_for_condition};
use crate::workload::Guestbook;

/// Field manager name used for shoot patches
pub const FIELD_MANAGER: &str = "shoot-operations";

/// Attempts for an update racing with other writers of the shoot
const MAX_UPDATE_ATTEMPTS: u32 = 5;

/// Outcome of persisting a shoot mutation.
#[derive(Debug, Clone, Copy)]
struct ShootUpdate {
    generation: Option<i64>,
    operation: Option<ShootOperation>,
}

/// Cluster handle for one shoot in one project namespace.
pub struct ShootFramework {
    config: FrameworkConfig,
    shoots: Api<Shoot>,
    secrets: Api<Secret>,
    shoot: Shoot,
}

impl ShootFramework {
    /// Connect to the garden cluster from the configured kubeconfig.
    pub async fn connect(config: FrameworkConfig) -> Result<Self> {
        let garden = client_from_path(config.kubeconfig.as_deref()).await?;
        Self::new(garden, config).await
    }

    /// Create the framework and fetch the shoot under test.
    pub async fn new(garden: Client, config: FrameworkConfig) -> Result<Self> {
        let shoots: Api<Shoot> = Api::namespaced(garden.clone(), &config.project_namespace);
        let secrets: Api<Secret> = Api::namespaced(garden, &config.project_namespace);
        let shoot = shoots.get(&config.shoot_name).await?;

        info!(
            shoot = %config.shoot_name,
            namespace = %config.project_namespace,
            generation = ?shoot.metadata.generation,
            "Using shoot"
        );

        Ok(Self {
            config,
            shoots,
            secrets,
            shoot,
        })
    }

    fn name(&self) -> &str {
        &self.config.shoot_name
    }

    /// Fetch the latest shoot, mutate it and send the difference as merge patch.
    ///
    /// Conflicts with concurrent writers are retried on a fresh copy.
    async fn patch_shoot<F>(&mut self, mutate: &mut F) -> Result<ShootUpdate>
    where
        F: FnMut(&mut Shoot) + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.shoots.get(self.name()).await?;
            let mut desired = current.clone();
            mutate(&mut desired);
            let operation = desired
                .operation_annotation()
                .and_then(|v| v.parse::<ShootOperation>().ok());

            let Some(patch) = shoot_patch(&current, &desired)? else {
                info!(shoot = %self.name(), "Shoot mutation is a no-op");
                let generation = current.metadata.generation;
                self.shoot = current;
                return Ok(ShootUpdate {
                    generation,
                    operation,
                });
            };

            let params = PatchParams {
                field_manager: Some(FIELD_MANAGER.to_string()),
                ..Default::default()
            };
            match self
                .shoots
                .patch(self.name(), &params, &Patch::Merge(&patch))
                .await
                .map_err(Error::Kube)
            {
                Ok(updated) => {
                    info!(
                        shoot = %updated.name_any(),
                        generation = ?updated.metadata.generation,
                        "Updated shoot"
                    );
                    let generation = updated.metadata.generation;
                    self.shoot = updated;
                    return Ok(ShootUpdate {
                        generation,
                        operation,
                    });
                }
                Err(e) if e.is_conflict() && attempt < MAX_UPDATE_ATTEMPTS => {
                    warn!(
                        shoot = %self.name(),
                        attempt = attempt,
                        "Conflict updating shoot, retrying on latest version"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Wait until the shoot satisfies the expectation and remember it.
    async fn wait_for_shoot(&mut self, expectation: ShootExpectation) -> Result<()> {
        info!(shoot = %self.name(), expectation = ?expectation, "Waiting for shoot");
        let shoot = wait_for_condition(
            &self.shoots,
            &self.config.shoot_name,
            |s| expectation.check(s),
            self.config.operation_timeout(),
        )
        .await?;
        self.shoot = shoot;
        info!(shoot = %self.name(), "Shoot reconciled");
        Ok(())
    }

    async fn set_hibernation(&mut self, enabled: bool) -> Result<()> {
        // The cached shoot may predate changes made outside this run
        self.refresh_shoot().await?;
        if hibernation_reached(&self.shoot, enabled) {
            info!(shoot = %self.name(), hibernated = enabled, "Shoot already in requested state");
            return Ok(());
        }

        let update = self
            .patch_shoot(&mut |s: &mut Shoot| s.set_hibernation(enabled))
            .await?;
        self.wait_for_shoot(
            ShootExpectation::at_generation(update.generation).with_hibernated(enabled),
        )
        .await
    }

    /// Client for the shoot cluster built from its static kubeconfig secret.
    pub async fn shoot_client(&self) -> Result<Client> {
        let secret_name = project_resource_name(self.name(), KUBECONFIG_SECRET_SUFFIX);
        let kubeconfig = get_secret_field(&self.secrets, &secret_name, KUBECONFIG_DATA_KEY).await?;
        client_from_kubeconfig_bytes(&kubeconfig).await
    }
}

impl ShootLifecycle for ShootFramework {
    type CredentialClient = Client;
    type Workload = Guestbook;

    fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    fn shoot(&self) -> &Shoot {
        &self.shoot
    }

    async fn refresh_shoot(&mut self) -> Result<()> {
        self.shoot = self.shoots.get(&self.config.shoot_name).await?;
        Ok(())
    }

    async fn update_shoot<F>(&mut self, mut mutate: F) -> Result<()>
    where
        F: FnMut(&mut Shoot) + Send,
    {
        let update = self.patch_shoot(&mut mutate).await?;
        let mut expectation = ShootExpectation::at_generation(update.generation);
        if let Some(operation) = update.operation {
            expectation = expectation.with_operation(operation);
        }
        self.wait_for_shoot(expectation).await
    }

    async fn hibernate(&mut self) -> Result<()> {
        info!(shoot = %self.name(), "Hibernating shoot");
        self.set_hibernation(true).await
    }

    async fn wake_up(&mut self) -> Result<()> {
        info!(shoot = %self.name(), "Waking up shoot");
        self.set_hibernation(false).await
    }

    async fn secret_field(&self, secret_name: &str, key: &str) -> Result<Vec<u8>> {
        get_secret_field(&self.secrets, secret_name, key).await
    }

    async fn credential_client(&self, kubeconfig: &[u8]) -> Result<Client> {
        client_from_kubeconfig_bytes(kubeconfig).await
    }

    async fn server_version(&self, client: &Client) -> Result<String> {
        server_version(client).await
    }

    async fn sample_workload(&self) -> Result<Guestbook> {
        let client = self.shoot_client().await?;
        Ok(Guestbook::new(client, self.config.guestbook.clone()))
    }
}
