//! Hibernate and wake up the shoot with a workload deployed.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::framework::error::{Error, Result};
use crate::framework::lifecycle::{SampleWorkload, ShootLifecycle};
use crate::scenarios::{Verdict, within_deadline};

const SCENARIO: &str = "hibernate-wake";

/// Budget for removing the workload after the scenario body finished.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Deploy and verify a guestbook, hibernate the shoot, wake it up again and
/// verify the same guestbook once it is ready.
///
/// The workload is removed afterwards whether the body passed or not. A body
/// failure is reported in preference to a cleanup failure.
pub async fn hibernate_and_wake<L: ShootLifecycle>(
    lifecycle: &mut L,
    timeout: Duration,
) -> Result<Verdict> {
    let deadline = Instant::now() + timeout;
    let mut workload =
        within_deadline(SCENARIO, deadline, timeout, lifecycle.sample_workload()).await?;

    let body = within_deadline(
        SCENARIO,
        deadline,
        timeout,
        hibernate_with_workload(lifecycle, &mut workload),
    )
    .await;

    let cleanup = tokio::time::timeout(CLEANUP_TIMEOUT, workload.cleanup())
        .await
        .map_err(|_| Error::Timeout {
            what: "workload cleanup".to_string(),
            after: CLEANUP_TIMEOUT,
        })
        .and_then(|result| result);

    match (body, cleanup) {
        (Err(e), Err(cleanup_error)) => {
            warn!(error = %cleanup_error, "Failed to clean up workload");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(Verdict::Passed),
    }
}

async fn hibernate_with_workload<L: ShootLifecycle>(
    lifecycle: &mut L,
    workload: &mut L::Workload,
) -> Result<()> {
    info!("Deploying sample workload");
    workload.deploy().await?;
    workload.verify().await?;

    info!("Hibernating shoot");
    lifecycle.hibernate().await?;

    info!("Waking up shoot");
    lifecycle.wake_up().await?;

    info!("Waiting for sample workload after wake up");
    workload.wait_until_ready().await?;
    workload.verify().await?;

    Ok(())
}
