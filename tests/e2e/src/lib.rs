//! ASUBT End-to-End Testing Framework
//!
//! Drives the offline cache worker the way a browser would: pages are
//! opened, versions are deployed, the network goes up and down, and the
//! responses pages receive are checked.

#![no_std]
extern crate alloc;

pub mod fixtures;
pub mod harness;
pub mod scenarios;

pub use fixtures::{AppFixtures, FakeNetwork};
pub use harness::OfflineHarness;
