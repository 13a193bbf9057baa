//! Sample workloads used as liveness oracles for the shoot.

mod guestbook;

pub use guestbook::Guestbook;
