//! Cache API Implementation
//!
//! Named request/response stores for the offline worker. Entries are keyed
//! by method and fragment-less URL and overwritten on every `put`.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::RwLock;

use super::fetch::{Request, Response};
use super::url::normalize;

/// Default quota per origin (50 MB).
pub const DEFAULT_QUOTA: usize = 50 * 1024 * 1024;

/// Cache storage shared between concurrently handled events.
pub type SharedCacheStorage = Arc<RwLock<CacheStorage>>;

/// Cache error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Cache not found
    NotFound,
    /// Quota exceeded
    QuotaExceeded {
        /// Bytes the put would need
        needed: usize,
        /// Bytes still free
        available: usize,
    },
    /// Entry could not be fetched for `add_all`
    FetchFailed(String),
}

impl core::fmt::Display for CacheError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CacheError::NotFound => write!(f, "cache not found"),
            CacheError::QuotaExceeded { needed, available } => write!(
                f,
                "cache quota exceeded ({} bytes needed, {} available)",
                needed, available
            ),
            CacheError::FetchFailed(s) => write!(f, "fetch failed: {}", s),
        }
    }
}

/// Cache match options
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheMatchOptions {
    /// Ignore search (query string)
    pub ignore_search: bool,
    /// Ignore method
    pub ignore_method: bool,
}

/// A cached request-response pair
#[derive(Debug, Clone)]
struct CacheEntry {
    request: Request,
    response: Response,
    size: usize,
}

impl CacheEntry {
    fn new(request: Request, response: Response) -> Self {
        let size = response.body.len();
        Self {
            request,
            response,
            size,
        }
    }
}

/// A named cache
#[derive(Debug, Clone)]
pub struct Cache {
    /// Cache name
    name: String,
    /// Cached entries (key -> entry)
    entries: BTreeMap<String, CacheEntry>,
    /// Total body size in bytes
    total_size: usize,
}

impl Cache {
    /// Create a new cache
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
            total_size: 0,
        }
    }

    /// Get cache name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Match a request
    pub fn match_request(
        &self,
        request: &Request,
        options: &CacheMatchOptions,
    ) -> Option<Response> {
        if !options.ignore_search {
            return self
                .entries
                .get(&make_key(request, options))
                .map(|e| e.response.clone());
        }
        let key = make_key(request, options);
        self.entries
            .values()
            .find(|e| make_key(&e.request, options) == key)
            .map(|e| e.response.clone())
    }

    /// Store a request/response pair, replacing any previous entry.
    fn put(&mut self, request: Request, response: Response) -> usize {
        let key = make_key(&request, &CacheMatchOptions::default());
        let entry = CacheEntry::new(request, response);
        let size = entry.size;

        if let Some(old) = self.entries.remove(&key) {
            self.total_size = self.total_size.saturating_sub(old.size);
        }

        self.entries.insert(key, entry);
        self.total_size += size;
        size
    }

    /// Size the cache would grow by if `request` were stored with `body_len`
    fn growth(&self, request: &Request, body_len: usize) -> usize {
        let key = make_key(request, &CacheMatchOptions::default());
        let old = self.entries.get(&key).map(|e| e.size).unwrap_or(0);
        body_len.saturating_sub(old)
    }

    /// Delete a cached request
    pub fn delete(&mut self, request: &Request) -> bool {
        let key = make_key(request, &CacheMatchOptions::default());
        if let Some(entry) = self.entries.remove(&key) {
            self.total_size = self.total_size.saturating_sub(entry.size);
            true
        } else {
            false
        }
    }

    /// Get all cached requests
    pub fn keys(&self) -> Vec<Request> {
        self.entries.values().map(|e| e.request.clone()).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get total size
    pub fn size(&self) -> usize {
        self.total_size
    }
}

/// Make a cache key from a request
fn make_key(request: &Request, options: &CacheMatchOptions) -> String {
    let mut key = normalize(&request.url);

    if options.ignore_search {
        if let Some(pos) = key.find('?') {
            key.truncate(pos);
        }
    }

    if !options.ignore_method {
        key = format!("{}:{}", request.method.as_str(), key);
    }

    key
}

/// Cache storage (manages every named cache of one origin)
#[derive(Debug)]
pub struct CacheStorage {
    /// Origin
    origin: String,
    /// Caches by name
    caches: BTreeMap<String, Cache>,
    /// Quota (bytes)
    quota: usize,
}

impl CacheStorage {
    /// Create new cache storage
    pub fn new(origin: impl Into<String>) -> Self {
        Self::with_quota(origin, DEFAULT_QUOTA)
    }

    /// Create cache storage with an explicit quota
    pub fn with_quota(origin: impl Into<String>, quota: usize) -> Self {
        Self {
            origin: origin.into(),
            caches: BTreeMap::new(),
            quota,
        }
    }

    /// Wrap into a shared handle
    pub fn shared(self) -> SharedCacheStorage {
        Arc::new(RwLock::new(self))
    }

    /// Open or create a cache
    pub fn open(&mut self, name: &str) -> &mut Cache {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Cache::new(name))
    }

    /// Get an existing cache
    pub fn get(&self, name: &str) -> Option<&Cache> {
        self.caches.get(name)
    }

    /// Check if a cache exists
    pub fn has(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Delete a cache
    pub fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    /// Get all cache names
    pub fn keys(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    /// Store into the named cache, creating it if needed.
    ///
    /// Fails without touching the cache when the quota would be exceeded.
    pub fn put(
        &mut self,
        cache_name: &str,
        request: Request,
        response: Response,
    ) -> Result<usize, CacheError> {
        let growth = self
            .caches
            .get(cache_name)
            .map(|c| c.growth(&request, response.body.len()))
            .unwrap_or(response.body.len());
        let available = self.quota.saturating_sub(self.usage());
        if growth > available {
            return Err(CacheError::QuotaExceeded {
                needed: growth,
                available,
            });
        }
        Ok(self.open(cache_name).put(request, response))
    }

    /// Store a batch atomically: either every pair lands or none does.
    pub fn put_all(
        &mut self,
        cache_name: &str,
        pairs: Vec<(Request, Response)>,
    ) -> Result<usize, CacheError> {
        let mut staged = self
            .caches
            .get(cache_name)
            .cloned()
            .unwrap_or_else(|| Cache::new(cache_name));
        let before = staged.size();
        for (request, response) in pairs {
            staged.put(request, response);
        }
        let growth = staged.size().saturating_sub(before);
        let available = self.quota.saturating_sub(self.usage());
        if growth > available {
            return Err(CacheError::QuotaExceeded {
                needed: growth,
                available,
            });
        }
        let count = staged.len();
        self.caches.insert(cache_name.to_string(), staged);
        Ok(count)
    }

    /// Match in one named cache
    pub fn match_in(&self, cache_name: &str, request: &Request) -> Option<Response> {
        self.caches
            .get(cache_name)
            .and_then(|c| c.match_request(request, &CacheMatchOptions::default()))
    }

    /// Match across all caches
    pub fn match_request(
        &self,
        request: &Request,
        options: &CacheMatchOptions,
    ) -> Option<Response> {
        self.caches
            .values()
            .find_map(|cache| cache.match_request(request, options))
    }

    /// Get quota
    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Get usage
    pub fn usage(&self) -> usize {
        self.caches.values().map(|c| c.size()).sum()
    }

    /// Get origin
    pub fn origin(&self) -> &str {
        &self.origin
    }
}
