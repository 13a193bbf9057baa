//! Resource generation module.
//!
//! Manifests of the sample workload deployed into the shoot.
//!
//! ## Resources Generated
//!
//! | Resource | Purpose |
//! |----------|---------|
//! | Namespace | Isolates one workload instance |
//! | redis Deployment | In-memory store |
//! | redis-master / redis-slave Services | Write and read endpoints of the store |
//! | guestbook Deployment + Service | HTTP front end |

pub mod common;
pub mod guestbook;

pub use common::{selector, standard_labels};
