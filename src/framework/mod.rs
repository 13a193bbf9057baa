//! Shoot test framework.
//!
//! Contains the cluster handle, the waiting primitive, secret and credential
//! helpers, and the lifecycle contract the scenarios are written against.

pub mod config;
pub mod credentials;
pub mod error;
pub mod lifecycle;
pub mod patch;
pub mod port_forward;
pub mod secrets;
pub mod shoot;
pub mod wait;

pub use config::{FrameworkConfig, GuestbookConfig};
pub use error::{Error, Result};
pub use lifecycle::{SampleWorkload, ShootLifecycle};
pub use shoot::ShootFramework;
