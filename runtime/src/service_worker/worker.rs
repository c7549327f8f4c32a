//! Offline cache worker
//!
//! One worker per deployed cache version. Install pre-caches the application
//! shell, activate purges every other cache store and claims open pages, and
//! fetch routes each request to the matching strategy.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use super::cache::{CacheError, SharedCacheStorage};
use super::clients::SharedClients;
use super::config::OfflineConfig;
use super::events::ExtendableEvent;
use super::fetch::{FetchEvent, FetchResult, Request, RequestMethod};
use super::lifecycle::{LifecycleEvent, LifecycleManager};
use super::network::Network;
use super::strategy::{self, StrategyContext};
use super::url::{resolve, Url};
use super::{ServiceWorkerError, ServiceWorkerId, ServiceWorkerState};

/// How a request is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted
    Passthrough,
    /// Cache-first (font hosts)
    CacheFirst,
    /// Network-first (everything else)
    NetworkFirst,
}

/// The offline cache worker
pub struct OfflineWorker {
    /// Unique identifier
    id: ServiceWorkerId,
    /// Configuration
    config: OfflineConfig,
    /// Current state
    state: ServiceWorkerState,
    /// Whether install asked to skip the waiting phase
    skip_waiting: bool,
    /// Cache storage of the origin
    storage: SharedCacheStorage,
    /// Open pages of the origin
    clients: SharedClients,
    /// Network used for fetches
    network: Arc<dyn Network>,
    /// Lifecycle events
    lifecycle: LifecycleManager,
}

impl OfflineWorker {
    /// Create a new worker in the `Parsed` state
    pub fn new(
        config: OfflineConfig,
        storage: SharedCacheStorage,
        clients: SharedClients,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            id: ServiceWorkerId::new(),
            config,
            state: ServiceWorkerState::Parsed,
            skip_waiting: false,
            storage,
            clients,
            network,
            lifecycle: LifecycleManager::new(),
        }
    }

    /// Get the worker ID
    pub fn id(&self) -> ServiceWorkerId {
        self.id
    }

    /// Get the configuration
    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    /// Name of the cache store this worker owns
    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    /// Get current state
    pub fn state(&self) -> ServiceWorkerState {
        self.state
    }

    /// Check if the worker intercepts fetches
    pub fn is_serving(&self) -> bool {
        self.state == ServiceWorkerState::Serving
    }

    /// Whether install asked to activate without waiting
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Lifecycle events dispatched so far
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Mutable lifecycle access, for adding listeners
    pub fn lifecycle_mut(&mut self) -> &mut LifecycleManager {
        &mut self.lifecycle
    }

    /// Ask to activate as soon as install finishes.
    pub fn skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    /// Run the install phase.
    ///
    /// Pre-caches the application shell. A failed pre-cache is logged and
    /// does not fail the install. Returns the number of shell entries stored.
    /// Requests `skip_waiting` unless the config turns it off.
    pub fn install(&mut self) -> Result<usize, ServiceWorkerError> {
        self.transition(ServiceWorkerState::Installing)?;

        self.storage.write().open(&self.config.cache_name);
        let cached = match self.precache() {
            Ok(count) => {
                log::info!(
                    "[SW] {} installed, {} shell entries cached",
                    self.config.cache_name,
                    count
                );
                count
            }
            Err(e) => {
                log::warn!("[SW] {} pre-cache failed: {}", self.config.cache_name, e);
                0
            }
        };

        self.transition(ServiceWorkerState::Installed)?;
        if self.config.skip_waiting {
            self.skip_waiting();
        }
        Ok(cached)
    }

    /// Fetch the shell and store it all-or-nothing.
    fn precache(&self) -> Result<usize, CacheError> {
        let mut pairs = Vec::with_capacity(self.config.shell.len());
        for path in &self.config.shell {
            let request = Request::new(resolve(&self.config.origin, path));
            let response = self
                .network
                .fetch(&request)
                .map_err(|e| CacheError::FetchFailed(format!("{}: {}", request.url, e)))?;
            if !response.ok() {
                return Err(CacheError::FetchFailed(format!(
                    "{}: status {}",
                    request.url, response.status
                )));
            }
            pairs.push((request, response));
        }
        self.storage.write().put_all(&self.config.cache_name, pairs)
    }

    /// Run the activate phase.
    ///
    /// Deletes every cache store except this worker's, then claims all open
    /// pages. Returns the names of the deleted stores.
    pub fn activate(&mut self) -> Result<Vec<String>, ServiceWorkerError> {
        self.transition(ServiceWorkerState::Activating)?;

        let purged: Vec<String> = {
            let mut storage = self.storage.write();
            let stale: Vec<String> = storage
                .keys()
                .into_iter()
                .filter(|name| *name != self.config.cache_name)
                .collect();
            for name in &stale {
                storage.delete(name);
                log::info!("[SW] deleted stale cache {}", name);
            }
            stale
        };

        let claimed = self.clients.write().claim(self.id);
        self.lifecycle.dispatch(LifecycleEvent::ControllerChange {
            worker_id: self.id,
            claimed,
        });

        self.transition(ServiceWorkerState::Serving)?;
        Ok(purged)
    }

    /// Mark the worker redundant (replaced or failed).
    pub fn retire(&mut self) -> Result<(), ServiceWorkerError> {
        self.transition(ServiceWorkerState::Redundant)
    }

    /// Decide how a request is handled.
    pub fn route(&self, request: &Request) -> Route {
        if request.method != RequestMethod::Get {
            return Route::Passthrough;
        }
        let url = match Url::parse(&request.url) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("[SW] not intercepting {}: {}", request.url, e);
                return Route::Passthrough;
            }
        };
        if self.config.is_extension_scheme(&url.scheme) {
            Route::Passthrough
        } else if self.config.is_font_host(&url.host) {
            Route::CacheFirst
        } else {
            Route::NetworkFirst
        }
    }

    /// Handle a fetch event. Leaves the event unanswered when the request
    /// passes through or the worker is not serving yet.
    pub fn handle_fetch(&self, event: &mut FetchEvent) {
        if !self.is_serving() {
            return;
        }

        let ctx = StrategyContext {
            storage: &self.storage,
            cache_name: &self.config.cache_name,
            network: self.network.as_ref(),
        };

        match self.route(event.request()) {
            Route::Passthrough => {}
            Route::CacheFirst => strategy::cache_first(&ctx, event),
            Route::NetworkFirst => {
                let fallback = resolve(&self.config.origin, &self.config.navigation_fallback);
                strategy::network_first(&ctx, event, &fallback, &self.config.messages);
            }
        }
    }

    /// Dispatch a fetch event end to end: respond, then settle deferred work.
    pub fn fetch(&self, request: Request) -> FetchResult {
        let mut event = FetchEvent::new(request);
        self.handle_fetch(&mut event);
        let result = event.take_result();
        event.settle();
        result
    }

    fn transition(&mut self, new_state: ServiceWorkerState) -> Result<(), ServiceWorkerError> {
        self.lifecycle
            .transition_state(self.id, &mut self.state, new_state)
    }
}

impl core::fmt::Debug for OfflineWorker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OfflineWorker")
            .field("id", &self.id)
            .field("cache_name", &self.config.cache_name)
            .field("state", &self.state)
            .finish()
    }
}
