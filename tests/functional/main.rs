// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Functional tests for the shoot operation scenarios.
//!
//! These tests run every scenario end to end WITHOUT requiring a garden
//! cluster. An in-memory garden implements the lifecycle contract and
//! simulates the gardenlet's reaction to shoot updates.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run specific test
//! cargo test --test functional test_rotate_ssh_keypair_keeps_previous_pair
//!
//! # Run with verbose output
//! cargo test --test functional -- --nocapture
//! ```
//!
//! ## Design Principles
//!
//! - **No Cluster Required**: The garden and the workload are simulated in memory
//! - **Real Predicates**: Shoot updates use the production merge patch and
//!   readiness logic, only the gardenlet is faked
//! - **Fault Injection**: Each failure path is driven by one injected fault
//! - **Paused Time**: Deadline tests expire instantly with `tokio::time::pause`

#[path = "../common/mod.rs"]
mod common;


// Re-export for use in tests
pub use mock_state::*;
