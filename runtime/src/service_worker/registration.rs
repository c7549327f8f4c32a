//! Service Worker Registration
//!
//! The container for one origin: deploys new cache versions, keeps track of
//! the active and waiting workers, and routes page fetches to whichever
//! worker controls them.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use super::cache::{CacheStorage, SharedCacheStorage};
use super::clients::{ClientId, Clients, SharedClients};
use super::config::OfflineConfig;
use super::fetch::{FetchResult, Request};
use super::network::Network;
use super::worker::OfflineWorker;
use super::{ServiceWorkerError, ServiceWorkerId};

/// Service Worker Container
///
/// Manages the offline worker of one origin.
pub struct ServiceWorkerContainer {
    /// Origin this container belongs to
    origin: String,
    /// Cache storage shared by every worker version
    storage: SharedCacheStorage,
    /// Open pages
    clients: SharedClients,
    /// Network handed to workers
    network: Arc<dyn Network>,
    /// Worker controlling pages
    active: Option<OfflineWorker>,
    /// Installed worker waiting for the active one to let go
    waiting: Option<OfflineWorker>,
    /// Workers made redundant, oldest first
    retired: Vec<ServiceWorkerId>,
}

impl ServiceWorkerContainer {
    /// Create a new container with empty cache storage
    pub fn new(origin: impl Into<String>, network: Arc<dyn Network>) -> Self {
        let origin = origin.into();
        let storage = CacheStorage::new(origin.clone()).shared();
        Self::with_storage(origin, storage, network)
    }

    /// Create a container over existing cache storage
    pub fn with_storage(
        origin: impl Into<String>,
        storage: SharedCacheStorage,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            origin: origin.into(),
            storage,
            clients: Clients::new().shared(),
            network,
            active: None,
            waiting: None,
            retired: Vec::new(),
        }
    }

    /// Get the origin
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Shared cache storage
    pub fn storage(&self) -> &SharedCacheStorage {
        &self.storage
    }

    /// Shared client registry
    pub fn clients(&self) -> &SharedClients {
        &self.clients
    }

    /// The controlling worker
    pub fn active(&self) -> Option<&OfflineWorker> {
        self.active.as_ref()
    }

    /// The waiting worker
    pub fn waiting(&self) -> Option<&OfflineWorker> {
        self.waiting.as_ref()
    }

    /// IDs of workers made redundant
    pub fn retired(&self) -> &[ServiceWorkerId] {
        &self.retired
    }

    /// Install a new worker version and, unless it has to wait, activate it.
    ///
    /// An empty `origin` in the config is filled with the container's.
    pub fn deploy(&mut self, mut config: OfflineConfig) -> Result<ServiceWorkerId, ServiceWorkerError> {
        config.validate()?;
        if config.origin.is_empty() {
            config.origin = self.origin.clone();
        }

        let mut worker = OfflineWorker::new(
            config,
            Arc::clone(&self.storage),
            Arc::clone(&self.clients),
            Arc::clone(&self.network),
        );
        let id = worker.id();

        if let Err(e) = worker.install() {
            let _ = worker.retire();
            self.retired.push(id);
            return Err(e);
        }

        // A newer install always supersedes the waiting one
        if let Some(mut superseded) = self.waiting.take() {
            log::info!("[SW] {} superseded before activation", superseded.cache_name());
            self.retire(&mut superseded);
        }

        if worker.skip_waiting_requested() || !self.has_controlled_clients() {
            self.promote(worker)?;
        } else {
            log::info!("[SW] {} installed, waiting", worker.cache_name());
            self.waiting = Some(worker);
        }

        Ok(id)
    }

    /// Route a fetch to the active worker.
    pub fn fetch(&self, request: Request) -> FetchResult {
        match &self.active {
            Some(worker) => worker.fetch(request),
            None => FetchResult::Passthrough,
        }
    }

    /// Route a fetch made by a specific page.
    ///
    /// Pages not controlled by the active worker are not intercepted.
    pub fn fetch_from(&self, client: ClientId, request: Request) -> FetchResult {
        let controller = self.clients.read().get(client).and_then(|c| c.controller);
        match &self.active {
            Some(worker) if controller == Some(worker.id()) => worker.fetch(request),
            _ => FetchResult::Passthrough,
        }
    }

    /// Register a page. Pages opened while a worker is active are
    /// controlled by it from the start.
    pub fn open_client(&mut self, url: impl Into<String>) -> ClientId {
        let controller = self.active.as_ref().map(|w| w.id());
        self.clients.write().open(url, controller)
    }

    /// Close a page. Promotes the waiting worker once no page is
    /// controlled by the active one.
    pub fn close_client(&mut self, id: ClientId) -> Result<(), ServiceWorkerError> {
        self.clients
            .write()
            .close(id)
            .ok_or(ServiceWorkerError::NotFound)?;

        if self.waiting.is_some() && !self.has_controlled_clients() {
            if let Some(worker) = self.waiting.take() {
                self.promote(worker)?;
            }
        }
        Ok(())
    }

    /// Unregister: retire every worker and drop all cache stores.
    pub fn unregister(&mut self) -> Result<(), ServiceWorkerError> {
        let mut found = false;
        for mut worker in [self.waiting.take(), self.active.take()].into_iter().flatten() {
            self.retire(&mut worker);
            found = true;
        }
        if !found {
            return Err(ServiceWorkerError::NotFound);
        }
        let mut storage = self.storage.write();
        for name in storage.keys() {
            storage.delete(&name);
        }
        Ok(())
    }

    fn has_controlled_clients(&self) -> bool {
        match &self.active {
            Some(worker) => self.clients.read().controlled_by(worker.id()) > 0,
            None => false,
        }
    }

    fn promote(&mut self, mut worker: OfflineWorker) -> Result<(), ServiceWorkerError> {
        if let Err(e) = worker.activate() {
            self.retire(&mut worker);
            return Err(e);
        }
        if let Some(mut previous) = self.active.replace(worker) {
            self.retire(&mut previous);
        }
        Ok(())
    }

    fn retire(&mut self, worker: &mut OfflineWorker) {
        if let Err(e) = worker.retire() {
            log::warn!("[SW] could not retire worker {}: {}", worker.id().raw(), e);
        }
        self.retired.push(worker.id());
    }
}

impl core::fmt::Debug for ServiceWorkerContainer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceWorkerContainer")
            .field("origin", &self.origin)
            .field("active", &self.active)
            .field("waiting", &self.waiting)
            .finish()
    }
}
