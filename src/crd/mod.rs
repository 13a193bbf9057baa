//! Custom Resource Definitions used by the scenarios.
//!
//! - `Shoot`: the Gardener cluster resource under test
//! - `ShootOperation`: values of the `gardener.cloud/operation` annotation

mod operation;
mod shoot;

pub use operation::*;
pub use shoot::*;
