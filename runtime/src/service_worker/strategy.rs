//! Caching strategies
//!
//! Cache-first for immutable font bytes, network-first for everything the
//! application serves, and the synthetic responses used when both the
//! network and the cache come up empty.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;

use super::cache::{CacheMatchOptions, SharedCacheStorage};
use super::config::OfflineMessages;
use super::events::ExtendableEvent;
use super::fetch::{FetchEvent, FetchSource, Request, Response};
use super::network::Network;

/// Where a strategy reads and writes.
pub struct StrategyContext<'a> {
    /// Shared cache storage
    pub storage: &'a SharedCacheStorage,
    /// Store that receives new entries
    pub cache_name: &'a str,
    /// Network used on cache miss
    pub network: &'a dyn Network,
}

impl StrategyContext<'_> {
    fn lookup(&self, request: &Request) -> Option<Response> {
        self.storage
            .read()
            .match_request(request, &CacheMatchOptions::default())
    }

    /// Queue a store of `response` that runs once the event settles.
    fn store_later(&self, event: &mut FetchEvent, response: &Response) {
        let storage = Arc::clone(self.storage);
        let cache_name = String::from(self.cache_name);
        let request = event.request().clone();
        let response = response.clone();
        event.wait_until(Box::new(move || {
            let url = request.url.clone();
            match storage.write().put(&cache_name, request, response) {
                Ok(size) => log::debug!("[SW Cache] stored {} ({} bytes)", url, size),
                Err(e) => log::warn!("[SW Cache] failed to store {}: {}", url, e),
            }
        }));
    }
}

/// Only plain 200 responses are stored; opaque cross-origin responses never.
fn cacheable(response: &Response) -> bool {
    response.status == 200 && !response.is_opaque()
}

/// Cache-first: cached copy if present, otherwise the network.
///
/// A 200 from the network is stored; a network failure yields an empty 503.
pub fn cache_first(ctx: &StrategyContext<'_>, event: &mut FetchEvent) {
    if let Some(cached) = ctx.lookup(event.request()) {
        event.respond_with(cached, FetchSource::Cache);
        return;
    }

    match ctx.network.fetch(event.request()) {
        Ok(response) => {
            if cacheable(&response) {
                ctx.store_later(event, &response);
            }
            event.respond_with(response, FetchSource::Network);
        }
        Err(e) => {
            log::debug!("[SW] {} unreachable: {}", event.request().url, e);
            event.respond_with(service_unavailable(), FetchSource::Offline);
        }
    }
}

/// Network-first: fresh response if reachable, cache only as a safety net.
///
/// Only status 200 is stored. When the network rejects, the exact cache
/// entry wins; navigations then fall back to `navigation_fallback` and
/// finally to the offline page, other requests to the offline text.
pub fn network_first(
    ctx: &StrategyContext<'_>,
    event: &mut FetchEvent,
    navigation_fallback: &str,
    messages: &OfflineMessages,
) {
    let err = match ctx.network.fetch(event.request()) {
        Ok(response) => {
            if cacheable(&response) {
                ctx.store_later(event, &response);
            }
            event.respond_with(response, FetchSource::Network);
            return;
        }
        Err(e) => e,
    };

    log::debug!(
        "[SW] {} unreachable ({}), trying cache",
        event.request().url,
        err
    );

    if let Some(cached) = ctx.lookup(event.request()) {
        event.respond_with(cached, FetchSource::Cache);
        return;
    }

    if event.request().is_navigation() {
        match ctx.lookup(&Request::new(navigation_fallback)) {
            Some(shell) => event.respond_with(shell, FetchSource::Cache),
            None => event.respond_with(offline_document(messages), FetchSource::Offline),
        }
    } else {
        event.respond_with(offline_text(messages), FetchSource::Offline);
    }
}

/// Empty 503.
pub fn service_unavailable() -> Response {
    Response::new(503)
}

/// 503 HTML page shown to navigations while offline.
pub fn offline_document(messages: &OfflineMessages) -> Response {
    Response::new(503)
        .with_header("Content-Type", "text/html; charset=utf-8")
        .with_body(messages.document_html.as_bytes())
}

/// 503 plain text for sub-resources and API calls while offline.
pub fn offline_text(messages: &OfflineMessages) -> Response {
    Response::new(503)
        .with_header("Content-Type", "text/plain; charset=utf-8")
        .with_body(messages.text.as_bytes())
}
