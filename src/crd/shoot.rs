//! Shoot Custom Resource (read view).
//!
//! Models the subset of `core.gardener.cloud/v1beta1` `Shoot` that the
//! scenarios read or write. Everything else is ignored on read and never
//! written back: updates are sent as JSON merge patches of the changed
//! fields only (see [`crate::framework::patch`]).

use jiff::Timestamp;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::operation::{GARDENER_OPERATION, ShootOperation};

/// A Gardener-managed Kubernetes cluster.
///
/// Example:
/// ```yaml
/// apiVersion: core.gardener.cloud/v1beta1
/// kind: Shoot
/// metadata:
///   name: local
///   namespace: garden-local
///   annotations:
///     gardener.cloud/operation: reconcile
/// spec:
///   kubernetes:
///     version: "1.31.1"
///     enableStaticTokenKubeconfig: true
///   hibernation:
///     enabled: false
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "core.gardener.cloud",
    version = "v1beta1",
    kind = "Shoot",
    plural = "shoots",
    status = "ShootStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ShootSpec {
    /// Kubernetes settings of the shoot control plane.
    #[serde(default)]
    pub kubernetes: KubernetesSpec,

    /// Hibernation settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hibernation: Option<HibernationSpec>,
}

/// Kubernetes settings of a shoot.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Whether a static token kubeconfig secret is issued for this shoot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_static_token_kubeconfig: Option<bool>,
}

/// Hibernation settings of a shoot.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HibernationSpec {
    /// Desired hibernation state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Observed state of a shoot as reported by the gardenlet.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShootStatus {
    /// Whether the control plane and workers are currently scaled down.
    #[serde(default)]
    pub hibernated: bool,

    /// Most recent generation observed by the gardenlet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<LastOperation>,

    /// Errors of the last operation, empty when it succeeded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub last_errors: Vec<LastError>,

    /// Health conditions (APIServerAvailable, ControlPlaneHealthy, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ShootCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ShootCredentials>,
}

/// The last operation performed on a shoot.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastOperation {
    #[serde(rename = "type", default)]
    pub r#type: LastOperationType,

    #[serde(default)]
    pub state: LastOperationState,

    /// Progress in percent (0-100).
    #[serde(default)]
    pub progress: i32,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
}

/// Kind of the last operation.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum LastOperationType {
    Create,
    #[default]
    Reconcile,
    Delete,
    Migrate,
    Restore,
    #[serde(other)]
    Unknown,
}

/// State of the last operation.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum LastOperationState {
    #[default]
    Pending,
    Processing,
    Succeeded,
    Error,
    Failed,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for LastOperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LastOperationState::Pending => write!(f, "Pending"),
            LastOperationState::Processing => write!(f, "Processing"),
            LastOperationState::Succeeded => write!(f, "Succeeded"),
            LastOperationState::Error => write!(f, "Error"),
            LastOperationState::Failed => write!(f, "Failed"),
            LastOperationState::Aborted => write!(f, "Aborted"),
            LastOperationState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// An error reported for the last operation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<String>,
}

/// A shoot health condition.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShootCondition {
    pub r#type: String,
    /// "True", "False", "Unknown" or "Progressing".
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

impl ShootCondition {
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// Credential status of a shoot.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShootCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<ShootCredentialsRotation>,
}

/// Rotation status per credential kind.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShootCredentialsRotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<CredentialRotation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_keypair: Option<CredentialRotation>,
}

/// Timestamps of the most recent rotation of one credential.
///
/// Timestamps are kept as the RFC 3339 strings the API server returns.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_initiation_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completion_time: Option<String>,
}

impl CredentialRotation {
    /// Parsed initiation time, `None` if unset or unparseable.
    pub fn initiated_at(&self) -> Option<Timestamp> {
        self.last_initiation_time.as_deref()?.parse().ok()
    }

    /// Parsed completion time, `None` if unset or unparseable.
    pub fn completed_at(&self) -> Option<Timestamp> {
        self.last_completion_time.as_deref()?.parse().ok()
    }
}

impl Shoot {
    /// Value of the `gardener.cloud/operation` annotation, if any.
    pub fn operation_annotation(&self) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(GARDENER_OPERATION))
            .map(String::as_str)
    }

    /// Set the `gardener.cloud/operation` annotation.
    pub fn set_operation(&mut self, operation: ShootOperation) {
        self.metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(GARDENER_OPERATION.to_string(), operation.to_string());
    }

    pub fn static_token_kubeconfig_enabled(&self) -> bool {
        self.spec
            .kubernetes
            .enable_static_token_kubeconfig
            .unwrap_or(false)
    }

    /// Desired hibernation state from the spec.
    pub fn hibernation_enabled(&self) -> bool {
        self.spec
            .hibernation
            .as_ref()
            .and_then(|h| h.enabled)
            .unwrap_or(false)
    }

    /// Set the desired hibernation state in the spec.
    pub fn set_hibernation(&mut self, enabled: bool) {
        self.spec
            .hibernation
            .get_or_insert_with(Default::default)
            .enabled = Some(enabled);
    }

    /// Observed hibernation state from the status.
    pub fn is_hibernated(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.hibernated)
    }

    pub fn last_operation(&self) -> Option<&LastOperation> {
        self.status.as_ref().and_then(|s| s.last_operation.as_ref())
    }

    fn rotation(&self) -> Option<&ShootCredentialsRotation> {
        self.status
            .as_ref()
            .and_then(|s| s.credentials.as_ref())
            .and_then(|c| c.rotation.as_ref())
    }

    pub fn kubeconfig_rotation(&self) -> Option<&CredentialRotation> {
        self.rotation().and_then(|r| r.kubeconfig.as_ref())
    }

    pub fn ssh_keypair_rotation(&self) -> Option<&CredentialRotation> {
        self.rotation().and_then(|r| r.ssh_keypair.as_ref())
    }
}
