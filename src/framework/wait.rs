//! Watch-based condition waiting.
//!
//! `wait_for_condition` checks the current state once and then follows a
//! watch on the single named object until the condition holds, fails, or the
//! timeout expires. The shoot predicates below are pure functions over a
//! fetched `Shoot` so they can be tested without a garden.

use std::fmt::Debug;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::Resource;
use kube::api::Api;
use kube::runtime::watcher::{self, Event};
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::debug;

use crate::crd::{LastOperationState, Shoot, ShootOperation};
use crate::framework::error::{Error, Result};

/// Wait for a resource to satisfy a condition.
///
/// The condition returns `Ok(true)` when satisfied, `Ok(false)` to keep
/// waiting and `Err(_)` to give up early (e.g. on a terminal failure state).
pub async fn wait_for_condition<K, F>(
    api: &Api<K>,
    name: &str,
    condition: F,
    timeout_duration: Duration,
) -> Result<K>
where
    K: Resource + Clone + Debug + DeserializeOwned + Send + 'static,
    <K as Resource>::DynamicType: Default,
    F: Fn(&K) -> Result<bool>,
{
    let kind = K::kind(&K::DynamicType::default()).to_string();
    let what = format!("{} {}", kind, name);

    let watch_future = async {
        let mut stream = watcher::watcher(
            api.clone(),
            watcher::Config::default().fields(&format!("metadata.name={}", name)),
        )
        .boxed();

        // Check the current state first
        match api.get(name).await {
            Ok(resource) => {
                if condition(&resource)? {
                    return Ok(resource);
                }
            }
            Err(kube::Error::Api(e)) if e.code == 404 => {}
            Err(e) => return Err(Error::Kube(e)),
        }

        while let Some(event) = stream.next().await {
            match event {
                Ok(Event::Apply(resource)) | Ok(Event::InitApply(resource)) => {
                    debug!(resource = %what, "Observed update");
                    if condition(&resource)? {
                        return Ok(resource);
                    }
                }
                Ok(Event::Delete(_)) => {
                    return Err(Error::ResourceDeleted(what.clone()));
                }
                Ok(Event::Init) | Ok(Event::InitDone) => {}
                Err(e) => {
                    return Err(Error::Watcher(e));
                }
            }
        }

        Err(Error::StreamEnded(what.clone()))
    };

    timeout(timeout_duration, watch_future)
        .await
        .map_err(|_| Error::Timeout {
            what: what.clone(),
            after: timeout_duration,
        })?
}

// ============================================================
// Shoot predicates
// ============================================================

/// What a caller expects from the shoot once the gardenlet caught up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShootExpectation {
    /// Generation the status must have observed.
    pub generation: Option<i64>,
    /// Operation annotation that must have been consumed.
    pub operation: Option<ShootOperation>,
    /// Observed hibernation state the status must report.
    pub hibernated: Option<bool>,
}

impl ShootExpectation {
    pub fn at_generation(generation: Option<i64>) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }

    pub fn with_operation(mut self, operation: ShootOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_hibernated(mut self, hibernated: bool) -> Self {
        self.hibernated = Some(hibernated);
        self
    }

    /// Evaluate the expectation, failing early on terminal shoot errors.
    ///
    /// The last operation only counts once the expected generation has been
    /// observed. Before that it still belongs to an earlier run.
    pub fn check(&self, shoot: &Shoot) -> Result<bool> {
        let generation_ok = match self.generation {
            Some(generation) => observed_generation(shoot) >= Some(generation),
            None => generation_observed(shoot),
        };
        if !generation_ok {
            return Ok(false);
        }

        if let Some(description) = terminal_failure(shoot) {
            return Err(Error::ShootFailed {
                name: shoot.metadata.name.clone().unwrap_or_default(),
                description,
            });
        }

        let operation_ok = self.operation.is_none_or(|op| operation_consumed(shoot, op));
        let hibernation_ok = self.hibernated.is_none_or(|h| shoot.is_hibernated() == h);

        Ok(operation_ok
            && hibernation_ok
            && last_operation_succeeded(shoot)
            && conditions_healthy(shoot))
    }
}

fn observed_generation(shoot: &Shoot) -> Option<i64> {
    shoot.status.as_ref().and_then(|s| s.observed_generation)
}

/// Check if the shoot's current generation has been observed.
pub fn generation_observed(shoot: &Shoot) -> bool {
    match (shoot.metadata.generation, observed_generation(shoot)) {
        (Some(current), Some(observed)) => observed >= current,
        _ => false,
    }
}

/// Check if the last operation completed successfully without errors.
pub fn last_operation_succeeded(shoot: &Shoot) -> bool {
    let no_errors = shoot
        .status
        .as_ref()
        .is_some_and(|s| s.last_errors.is_empty());
    let succeeded = shoot
        .last_operation()
        .is_some_and(|op| op.state == LastOperationState::Succeeded && op.progress == 100);
    no_errors && succeeded
}

/// Check if all health conditions are true.
///
/// A hibernated shoot has no running control plane, so its conditions are
/// not considered.
pub fn conditions_healthy(shoot: &Shoot) -> bool {
    if shoot.is_hibernated() {
        return true;
    }
    shoot
        .status
        .as_ref()
        .is_none_or(|s| s.conditions.iter().all(|c| c.is_true()))
}

/// Check if both the desired and the observed hibernation state match.
pub fn hibernation_reached(shoot: &Shoot, enabled: bool) -> bool {
    shoot.hibernation_enabled() == enabled && shoot.is_hibernated() == enabled
}

/// Check if the controllers picked up the requested operation.
///
/// Consumption means the annotation was removed or replaced.
pub fn operation_consumed(shoot: &Shoot, operation: ShootOperation) -> bool {
    shoot
        .operation_annotation()
        .is_none_or(|value| value != operation.as_str())
}

/// Description of a terminal failure of the last operation, if any.
///
/// Only `Failed` and `Aborted` are terminal. `Error` is retried by the
/// gardenlet and may still turn into success before the deadline.
pub fn terminal_failure(shoot: &Shoot) -> Option<String> {
    let status = shoot.status.as_ref()?;
    let op = status.last_operation.as_ref()?;
    if !matches!(
        op.state,
        LastOperationState::Failed | LastOperationState::Aborted
    ) {
        return None;
    }
    let mut description = format!("last operation {}: {}", op.state, op.description);
    for err in &status.last_errors {
        description.push_str("; ");
        description.push_str(&err.description);
    }
    Some(description)
}

/// Check if a Deployment has all desired replicas ready and updated.
pub fn deployment_ready(deployment: &Deployment) -> bool {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let Some(status) = deployment.status.as_ref() else {
        return false;
    };
    let observed = match (deployment.metadata.generation, status.observed_generation) {
        (Some(current), Some(observed)) => observed >= current,
        _ => true,
    };
    observed
        && status.ready_replicas.unwrap_or(0) >= desired
        && status.updated_replicas.unwrap_or(0) >= desired
}
