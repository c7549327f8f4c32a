//! Controlled clients
//!
//! Tracks the pages open under the worker's origin and which worker, if any,
//! controls each of them.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};
use spin::RwLock;

use super::ServiceWorkerId;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Client registry shared between the container and its workers.
pub type SharedClients = Arc<RwLock<Clients>>;

/// Client ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    fn new() -> Self {
        Self(NEXT_CLIENT_ID.fetch_add(1, Ordering::SeqCst))
    }
}

/// An open page
#[derive(Debug, Clone)]
pub struct Client {
    /// Client ID
    pub id: ClientId,
    /// Page URL
    pub url: String,
    /// Controlling worker
    pub controller: Option<ServiceWorkerId>,
}

/// Open pages by ID
#[derive(Debug, Default)]
pub struct Clients {
    clients: BTreeMap<ClientId, Client>,
}

impl Clients {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            clients: BTreeMap::new(),
        }
    }

    /// Wrap into a shared handle
    pub fn shared(self) -> SharedClients {
        Arc::new(RwLock::new(self))
    }

    /// Register a page. It starts out uncontrolled unless `controller` is set.
    pub fn open(&mut self, url: impl Into<String>, controller: Option<ServiceWorkerId>) -> ClientId {
        let id = ClientId::new();
        self.clients.insert(
            id,
            Client {
                id,
                url: url.into(),
                controller,
            },
        );
        id
    }

    /// Remove a page
    pub fn close(&mut self, id: ClientId) -> Option<Client> {
        self.clients.remove(&id)
    }

    /// Look up a page
    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// All open pages
    pub fn match_all(&self) -> Vec<&Client> {
        self.clients.values().collect()
    }

    /// Pages controlled by `worker_id`
    pub fn controlled_by(&self, worker_id: ServiceWorkerId) -> usize {
        self.clients
            .values()
            .filter(|c| c.controller == Some(worker_id))
            .count()
    }

    /// Make `worker_id` the controller of every open page.
    ///
    /// Returns the number of pages whose controller changed.
    pub fn claim(&mut self, worker_id: ServiceWorkerId) -> usize {
        let mut changed = 0;
        for client in self.clients.values_mut() {
            if client.controller != Some(worker_id) {
                client.controller = Some(worker_id);
                changed += 1;
            }
        }
        changed
    }

    /// Number of open pages
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no page is open
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
