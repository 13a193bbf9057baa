//! Capability contract of the cluster-lifecycle collaborator.
//!
//! Scenarios are written against these traits. [`ShootFramework`] implements
//! them against a live garden cluster; tests implement them against an
//! in-memory garden.
//!
//! [`ShootFramework`]: crate::framework::shoot::ShootFramework

use std::future::Future;

use crate::crd::Shoot;
use crate::framework::config::FrameworkConfig;
use crate::framework::error::Result;

/// Lifecycle operations on the shoot under test.
///
/// All mutating operations wait until the gardenlet reports the shoot as
/// reconciled again; retrying for eventual consistency happens here, never in
/// the scenarios.
pub trait ShootLifecycle: Send + Sync {
    /// Client authenticated with one specific kubeconfig.
    type CredentialClient: Send + Sync;
    /// Sample workload deployed into the shoot.
    type Workload: SampleWorkload;

    fn config(&self) -> &FrameworkConfig;

    /// Last observed state of the shoot.
    fn shoot(&self) -> &Shoot;

    /// Re-read the shoot from the API server.
    fn refresh_shoot(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Apply `mutate` to the latest shoot, persist it, and wait for the
    /// reconciliation it triggers.
    fn update_shoot<F>(&mut self, mutate: F) -> impl Future<Output = Result<()>> + Send
    where
        F: FnMut(&mut Shoot) + Send;

    /// Hibernate the shoot and wait until it is hibernated.
    fn hibernate(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Wake the shoot up and wait until it is running again.
    fn wake_up(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Read one non-empty field of a secret in the project namespace.
    fn secret_field(
        &self,
        secret_name: &str,
        key: &str,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Build a client authenticated with the given kubeconfig.
    fn credential_client(
        &self,
        kubeconfig: &[u8],
    ) -> impl Future<Output = Result<Self::CredentialClient>> + Send;

    /// Query the server version; fails if the credentials are rejected.
    fn server_version(
        &self,
        client: &Self::CredentialClient,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Prepare the sample workload for this shoot (nothing is deployed yet).
    fn sample_workload(&self) -> impl Future<Output = Result<Self::Workload>> + Send;
}

/// Application used as a liveness oracle for the shoot.
pub trait SampleWorkload: Send {
    /// Deploy the workload and wait until it is ready.
    fn deploy(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Wait until every component of the workload is ready.
    fn wait_until_ready(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Exercise the workload end to end.
    fn verify(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Remove everything the workload created.
    fn cleanup(&mut self) -> impl Future<Output = Result<()>> + Send;
}
