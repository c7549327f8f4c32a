//! Offline test harness
//!
//! Plays the browser's part: owns the network and the worker container,
//! and performs the plain network fetch itself when the worker lets a
//! request pass through.

use alloc::sync::Arc;

use asubt_runtime::service_worker::{
    FetchResult, FetchSource, Network, NetworkError, OfflineConfig, Request, Response,
    ServiceWorkerContainer, ServiceWorkerError, ServiceWorkerId, SharedCacheStorage,
};

use crate::fixtures::{AppFixtures, FakeNetwork};

/// How the page got its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    /// The worker answered
    Worker(FetchSource),
    /// The worker let the request through to the network
    Bypassed,
}

/// Harness around a container for the fixture origin
pub struct OfflineHarness {
    network: Arc<FakeNetwork>,
    container: ServiceWorkerContainer,
}

impl OfflineHarness {
    /// Fresh browser profile: empty cache, online network
    pub fn new() -> Self {
        let network = Arc::new(FakeNetwork::asubt(AppFixtures::ORIGIN));
        let container = ServiceWorkerContainer::new(AppFixtures::ORIGIN, network.clone());
        Self { network, container }
    }

    /// Browser profile that already has `storage` on disk
    pub fn with_storage(storage: SharedCacheStorage) -> Self {
        let network = Arc::new(FakeNetwork::asubt(AppFixtures::ORIGIN));
        let container =
            ServiceWorkerContainer::with_storage(AppFixtures::ORIGIN, storage, network.clone());
        Self { network, container }
    }

    /// The scripted network
    pub fn network(&self) -> &FakeNetwork {
        &self.network
    }

    /// The worker container
    pub fn container(&self) -> &ServiceWorkerContainer {
        &self.container
    }

    /// Mutable container access
    pub fn container_mut(&mut self) -> &mut ServiceWorkerContainer {
        &mut self.container
    }

    /// Deploy a worker with the given cache name
    pub fn deploy(&mut self, cache_name: &str) -> Result<ServiceWorkerId, ServiceWorkerError> {
        self.container
            .deploy(OfflineConfig::for_origin(AppFixtures::ORIGIN).with_cache_name(cache_name))
    }

    /// Cut connectivity
    pub fn go_offline(&self) {
        self.network.go_offline();
    }

    /// Restore connectivity
    pub fn go_online(&self) {
        self.network.go_online();
    }

    /// Raw worker result for a request
    pub fn dispatch(&self, request: Request) -> FetchResult {
        self.container.fetch(request)
    }

    /// Load a request as a page would, falling back to a plain network
    /// fetch when the worker does not respond.
    pub fn load(&self, request: Request) -> Result<(Response, Served), NetworkError> {
        match self.container.fetch(request.clone()) {
            FetchResult::Response(r) => Ok((r.response, Served::Worker(r.source))),
            FetchResult::Passthrough => {
                let response = self.network.fetch(&request)?;
                Ok((response, Served::Bypassed))
            }
        }
    }

    /// Navigate to a path under the fixture origin
    pub fn navigate(&self, path: &str) -> Result<(Response, Served), NetworkError> {
        self.load(Request::navigate(AppFixtures::url(path)))
    }
}

impl Default for OfflineHarness {
    fn default() -> Self {
        Self::new()
    }
}
