//! Shoot operation scenarios.
//!
//! Each scenario drives one lifecycle operation of the shoot through the
//! [`ShootLifecycle`] contract and asserts on the resulting state. They run
//! strictly one after another, each under its own deadline.
//!
//! | Scenario | Labels | Timeout |
//! |----------|--------|---------|
//! | `hibernate-wake` | default, serial | 1h |
//! | `reconcile` | default, serial | 40m |
//! | `rotate-kubeconfig` | beta, disruptive | 40m |
//! | `rotate-ssh-keypair` | beta, serial | 40m |

mod hibernation;
mod kubeconfig_rotation;
mod reconcile;
pub mod report;
pub mod runner;
mod ssh_keypair_rotation;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use tokio::time::Instant;

use crate::framework::error::{Error, Result};
use crate::framework::lifecycle::ShootLifecycle;

pub use hibernation::hibernate_and_wake;
pub use kubeconfig_rotation::rotate_kubeconfig;
pub use reconcile::maintain_and_reconcile;
pub use report::{Outcome, RunReport, ScenarioResult};
pub use runner::{Selection, run_scenarios};
pub use ssh_keypair_rotation::rotate_ssh_keypair;

pub const LABEL_DEFAULT: &str = "default";
pub const LABEL_BETA: &str = "beta";
pub const LABEL_SERIAL: &str = "serial";
pub const LABEL_DISRUPTIVE: &str = "disruptive";

const HIBERNATION_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const OPERATION_TIMEOUT: Duration = Duration::from_secs(40 * 60);

/// Named scenario of the suite, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Scenario {
    /// Hibernate and wake up the shoot with a workload deployed
    HibernateWake,
    /// Maintain and then reconcile the shoot
    Reconcile,
    /// Rotate the static token kubeconfig
    RotateKubeconfig,
    /// Rotate the SSH keypair of the worker nodes
    RotateSshKeypair,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::HibernateWake,
        Scenario::Reconcile,
        Scenario::RotateKubeconfig,
        Scenario::RotateSshKeypair,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::HibernateWake => "hibernate-wake",
            Scenario::Reconcile => "reconcile",
            Scenario::RotateKubeconfig => "rotate-kubeconfig",
            Scenario::RotateSshKeypair => "rotate-ssh-keypair",
        }
    }

    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Scenario::HibernateWake | Scenario::Reconcile => &[LABEL_DEFAULT, LABEL_SERIAL],
            Scenario::RotateKubeconfig => &[LABEL_BETA, LABEL_DISRUPTIVE],
            Scenario::RotateSshKeypair => &[LABEL_BETA, LABEL_SERIAL],
        }
    }

    pub fn has_label(self, label: &str) -> bool {
        self.labels().contains(&label)
    }

    /// Hard deadline of one run of this scenario.
    pub fn timeout(self) -> Duration {
        match self {
            Scenario::HibernateWake => HIBERNATION_TIMEOUT,
            _ => OPERATION_TIMEOUT,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Scenario::HibernateWake => "hibernate and wake up the shoot with a guestbook deployed",
            Scenario::Reconcile => "maintain and reconcile the shoot",
            Scenario::RotateKubeconfig => "rotate the static token kubeconfig",
            Scenario::RotateSshKeypair => "rotate the worker SSH keypair",
        }
    }

    /// Run the scenario against the lifecycle under its own deadline.
    pub async fn run<L: ShootLifecycle>(self, lifecycle: &mut L) -> Result<Verdict> {
        self.run_with_timeout(lifecycle, self.timeout()).await
    }

    /// Run the scenario with an explicit deadline instead of the default one.
    pub async fn run_with_timeout<L: ShootLifecycle>(
        self,
        lifecycle: &mut L,
        timeout: Duration,
    ) -> Result<Verdict> {
        match self {
            Scenario::HibernateWake => hibernate_and_wake(lifecycle, timeout).await,
            Scenario::Reconcile => maintain_and_reconcile(lifecycle, timeout).await,
            Scenario::RotateKubeconfig => rotate_kubeconfig(lifecycle, timeout).await,
            Scenario::RotateSshKeypair => rotate_ssh_keypair(lifecycle, timeout).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| format!("Unknown scenario: {}", s))
    }
}

/// Result of a scenario that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    /// Precondition not met, nothing was changed
    Skipped(String),
}

/// Run `future` until `deadline`, reporting expiry as a timeout of `what`.
pub(crate) async fn within_deadline<T>(
    what: &str,
    deadline: Instant,
    budget: Duration,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout_at(deadline, future)
        .await
        .map_err(|_| Error::Timeout {
            what: what.to_string(),
            after: budget,
        })?
}
