//! Service Worker Module
//!
//! Offline cache worker for the АСУБТ web client: lifecycle management,
//! Cache Storage, and fetch interception with cache-first/network-first
//! strategies.

mod cache;
mod clients;
mod config;
mod events;
mod fetch;
mod lifecycle;
mod network;
mod registration;
mod strategy;
mod url;
mod worker;

pub use cache::*;
pub use clients::*;
pub use config::*;
pub use events::*;
pub use fetch::*;
pub use lifecycle::*;
pub use network::*;
pub use registration::*;
pub use strategy::{offline_document, offline_text, service_unavailable};
pub use url::{resolve, Url, UrlError};
pub use worker::*;

use alloc::string::String;
use core::sync::atomic::{AtomicU64, Ordering};

/// Service Worker global ID counter
static NEXT_SW_ID: AtomicU64 = AtomicU64::new(1);

/// Service Worker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceWorkerState {
    /// Created, no lifecycle event delivered yet
    #[default]
    Parsed,
    /// Install event running (pre-caching the shell)
    Installing,
    /// Installed, waiting to activate
    Installed,
    /// Activate event running (purging stale caches)
    Activating,
    /// Active and intercepting fetches
    Serving,
    /// Failed or replaced
    Redundant,
}

/// Service Worker error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceWorkerError {
    /// State transition invalid
    InvalidStateTransition {
        /// Current state
        from: ServiceWorkerState,
        /// Requested state
        to: ServiceWorkerState,
    },
    /// Worker configuration rejected
    InvalidConfig(String),
    /// Not found
    NotFound,
}

impl core::fmt::Display for ServiceWorkerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ServiceWorkerError::InvalidStateTransition { from, to } => {
                write!(f, "invalid state transition {:?} -> {:?}", from, to)
            }
            ServiceWorkerError::InvalidConfig(s) => write!(f, "invalid config: {}", s),
            ServiceWorkerError::NotFound => write!(f, "service worker not found"),
        }
    }
}

impl From<ConfigError> for ServiceWorkerError {
    fn from(e: ConfigError) -> Self {
        use alloc::string::ToString;
        ServiceWorkerError::InvalidConfig(e.to_string())
    }
}

/// Service Worker ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceWorkerId(u64);

impl ServiceWorkerId {
    /// Create a new unique ID
    pub fn new() -> Self {
        Self(NEXT_SW_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Get raw value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ServiceWorkerId {
    fn default() -> Self {
        Self::new()
    }
}
