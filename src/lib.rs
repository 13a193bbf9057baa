//! shoot-operations library crate
//!
//! End-to-end scenarios for the lifecycle operations of a Gardener shoot:
//! hibernation, reconciliation and credential rotation. Exports the Shoot
//! resource definitions, the test framework, the sample workload and the
//! scenarios with their runner.

pub mod crd;
pub mod framework;
pub mod resources;
pub mod scenarios;
pub mod workload;

pub use framework::{Error, FrameworkConfig, Result, SampleWorkload, ShootFramework, ShootLifecycle};
pub use scenarios::{RunReport, Scenario, Selection, Verdict, run_scenarios};
