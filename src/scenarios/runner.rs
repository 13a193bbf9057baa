//! Serial scenario runner.

use tokio::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};

use crate::framework::lifecycle::ShootLifecycle;
use crate::scenarios::report::{Outcome, RunReport, ScenarioResult};
use crate::scenarios::{Scenario, Verdict};

/// Which scenarios to run.
///
/// Empty name and label lists select everything. When both are given a
/// scenario must match a name and carry one of the labels.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    pub names: Vec<Scenario>,
    pub labels: Vec<String>,
}

impl Selection {
    pub fn matches(&self, scenario: Scenario) -> bool {
        let by_name = self.names.is_empty() || self.names.contains(&scenario);
        let by_label =
            self.labels.is_empty() || self.labels.iter().any(|l| scenario.has_label(l));
        by_name && by_label
    }

    /// Selected scenarios in execution order.
    pub fn scenarios(&self) -> Vec<Scenario> {
        Scenario::ALL
            .into_iter()
            .filter(|s| self.matches(*s))
            .collect()
    }
}

/// Run the scenarios one after another and collect their outcomes.
///
/// A failing scenario does not stop the run; later scenarios still execute.
pub async fn run_scenarios<L: ShootLifecycle>(
    lifecycle: &mut L,
    scenarios: &[Scenario],
) -> RunReport {
    let config = lifecycle.config();
    let mut report = RunReport::new(&config.project_namespace, &config.shoot_name);

    for &scenario in scenarios {
        let span = info_span!("scenario", name = scenario.name());
        let started = Instant::now();

        let outcome = async {
            info!(description = scenario.description(), "Starting scenario");
            match scenario.run(lifecycle).await {
                Ok(Verdict::Passed) => {
                    info!("Scenario passed");
                    Outcome::Passed
                }
                Ok(Verdict::Skipped(reason)) => {
                    warn!(reason = %reason, "Scenario skipped");
                    Outcome::Skipped { reason }
                }
                Err(e) => {
                    error!(error = %e, "Scenario failed");
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            }
        }
        .instrument(span)
        .await;

        report.push(ScenarioResult::new(scenario, outcome, started.elapsed()));
    }

    report
}
