//! АСУБТ offline runtime
//!
//! Offline cache worker for the АСУБТ labor-safety web client. The worker
//! sits between the client's pages and the network: application resources
//! are fetched network-first with the cache as an offline safety net, web
//! fonts are served cache-first, and navigations fall back to the cached
//! application shell when the network is gone.
//!
//! # Architecture
//!
//! - `service_worker::ServiceWorkerContainer`: per-origin registration that
//!   deploys cache versions and routes page fetches
//! - `service_worker::OfflineWorker`: install / activate / fetch handlers
//! - `service_worker::CacheStorage`: named request/response stores with quota
//! - `service_worker::Network`: host-provided network fetch
//! - `service_worker::OfflineConfig`: cache version, shell, font hosts,
//!   offline texts
//!
//! The crate is `no_std` and only needs `alloc`.

#![no_std]

extern crate alloc;

pub mod service_worker;

pub use service_worker::{
    FetchResult, FetchSource, Network, NetworkError, OfflineConfig, OfflineWorker, Request,
    Response, ServiceWorkerContainer, ServiceWorkerError, CACHE_VERSION,
};

/// Runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
