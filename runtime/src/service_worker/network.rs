//! Network seam
//!
//! The worker never talks to sockets itself; the host hands it a `Network`
//! that performs the actual HTTP fetch.

use alloc::string::String;

use super::fetch::{Request, Response};

/// Network error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// No connectivity
    Offline,
    /// Request timed out
    Timeout,
    /// Connection failed for another reason
    ConnectionFailed(String),
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NetworkError::Offline => write!(f, "network unreachable"),
            NetworkError::Timeout => write!(f, "request timed out"),
            NetworkError::ConnectionFailed(s) => write!(f, "connection failed: {}", s),
        }
    }
}

/// Performs fetches on behalf of the worker.
///
/// An `Err` means the fetch rejected. Any HTTP status, including error
/// statuses, is an `Ok` response.
pub trait Network: Send + Sync {
    /// Fetch a request from the network
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Network that is always unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNetwork;

impl Network for OfflineNetwork {
    fn fetch(&self, _request: &Request) -> Result<Response, NetworkError> {
        Err(NetworkError::Offline)
    }
}
