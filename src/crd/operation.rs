//! The `gardener.cloud/operation` annotation.
//!
//! Writing the annotation asks the gardener controllers to perform an
//! operation on the shoot. Controllers remove (or replace) the annotation once
//! they picked the operation up.

/// Annotation key that triggers shoot operations.
pub const GARDENER_OPERATION: &str = "gardener.cloud/operation";

/// Operations requested through [`GARDENER_OPERATION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShootOperation {
    /// Run the maintenance (version and image updates) out of schedule.
    Maintain,
    /// Run a full reconciliation.
    Reconcile,
    /// Issue a new static token kubeconfig and invalidate the old one.
    RotateKubeconfigCredentials,
    /// Issue a new SSH keypair for the worker nodes, keeping the old one.
    RotateSshKeypair,
}

impl ShootOperation {
    /// Annotation value.
    pub fn as_str(self) -> &'static str {
        match self {
            ShootOperation::Maintain => "maintain",
            ShootOperation::Reconcile => "reconcile",
            ShootOperation::RotateKubeconfigCredentials => "rotate-kubeconfig-credentials",
            ShootOperation::RotateSshKeypair => "rotate-ssh-keypair",
        }
    }
}

impl std::fmt::Display for ShootOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShootOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maintain" => Ok(ShootOperation::Maintain),
            "reconcile" => Ok(ShootOperation::Reconcile),
            "rotate-kubeconfig-credentials" => Ok(ShootOperation::RotateKubeconfigCredentials),
            "rotate-ssh-keypair" => Ok(ShootOperation::RotateSshKeypair),
            _ => Err(format!("Unknown shoot operation: {}", s)),
        }
    }
}
