//! Fetch Event Handling
//!
//! Request/response types and the fetch event delivered to the worker for
//! every request a controlled page makes.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::events::{EventType, ExtendableEvent, LifetimeExtensions, LifetimeTask};

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl RequestMethod {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Parse a method name, case-insensitively
    pub fn parse(method: &str) -> Option<Self> {
        let method = method.trim();
        [
            Self::Get,
            Self::Post,
            Self::Put,
            Self::Delete,
            Self::Patch,
            Self::Head,
            Self::Options,
        ]
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(method))
    }
}

/// Request destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestDestination {
    /// `fetch()` / XHR
    #[default]
    Empty,
    /// Top-level navigation
    Document,
    /// Font
    Font,
    /// Image
    Image,
    /// Manifest
    Manifest,
    /// Script
    Script,
    /// Style
    Style,
    /// Worker
    Worker,
}

/// Request mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// CORS
    #[default]
    Cors,
    /// Navigate
    Navigate,
}

/// Fetch request
#[derive(Debug, Clone)]
pub struct Request {
    /// Request URL
    pub url: String,
    /// HTTP method
    pub method: RequestMethod,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Request body (if any)
    pub body: Option<Vec<u8>>,
    /// Request destination
    pub destination: RequestDestination,
    /// Request mode
    pub mode: RequestMode,
}

impl Request {
    /// Create a new GET request
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: RequestMethod::Get,
            headers: BTreeMap::new(),
            body: None,
            destination: RequestDestination::Empty,
            mode: RequestMode::Cors,
        }
    }

    /// Create a top-level navigation request
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::new(url)
            .with_destination(RequestDestination::Document)
            .with_mode(RequestMode::Navigate)
    }

    /// Set the method
    pub fn with_method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the destination
    pub fn with_destination(mut self, destination: RequestDestination) -> Self {
        self.destination = destination;
        self
    }

    /// Set the mode
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Whether this is a full-page navigation
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate || self.destination == RequestDestination::Document
    }
}

/// Response type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// Readable response
    #[default]
    Default,
    /// No-CORS cross-origin, body and status hidden
    Opaque,
}

/// Fetch response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response type
    pub response_type: ResponseType,
    /// Final URL
    pub url: String,
    /// Status code
    pub status: u16,
    /// Status text
    pub status_text: String,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response
    pub fn new(status: u16) -> Self {
        Self {
            response_type: ResponseType::Default,
            url: String::new(),
            status,
            status_text: status_text_for(status).to_string(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Opaque cross-origin response (status 0)
    pub fn opaque() -> Self {
        Self {
            response_type: ResponseType::Opaque,
            status: 0,
            status_text: String::new(),
            ..Self::new(0)
        }
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the final URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Whether this is an opaque cross-origin response
    pub fn is_opaque(&self) -> bool {
        self.response_type == ResponseType::Opaque
    }

    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Header lookup, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8 text, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Get status text for status code
fn status_text_for(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

/// Where a response handed to the page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Fresh from the network
    Network,
    /// From the Cache Storage
    Cache,
    /// Synthesized by the worker while offline
    Offline,
}

/// Response handed back through `respond_with`
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The response
    pub response: Response,
    /// Where it came from
    pub source: FetchSource,
}

impl FetchResponse {
    /// Create a new fetch response
    pub fn new(response: Response, source: FetchSource) -> Self {
        Self { response, source }
    }
}

/// Outcome of dispatching a fetch event
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// The worker did not call `respond_with`; the host fetches normally
    Passthrough,
    /// The worker responded
    Response(FetchResponse),
}

impl FetchResult {
    /// Whether the request passed through untouched
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough)
    }

    /// The response, if the worker produced one
    pub fn response(&self) -> Option<&FetchResponse> {
        match self {
            Self::Response(r) => Some(r),
            Self::Passthrough => None,
        }
    }

    /// Consume into the response, if any
    pub fn into_response(self) -> Option<FetchResponse> {
        match self {
            Self::Response(r) => Some(r),
            Self::Passthrough => None,
        }
    }
}

/// Fetch event
#[derive(Debug)]
pub struct FetchEvent {
    /// Request
    request: Request,
    /// Response (if respondWith was called)
    response: Option<FetchResponse>,
    /// Whether respondWith was called
    responded: bool,
    /// Work registered through wait_until
    extensions: LifetimeExtensions,
}

impl FetchEvent {
    /// Create a new fetch event
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: None,
            responded: false,
            extensions: LifetimeExtensions::new(),
        }
    }

    /// Get the request
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Check if respondWith was called
    pub fn responded(&self) -> bool {
        self.responded
    }

    /// Respond with a response. Only the first call counts.
    pub fn respond_with(&mut self, response: Response, source: FetchSource) {
        if !self.responded {
            self.responded = true;
            self.response = Some(FetchResponse::new(response, source));
        }
    }

    /// Take the result, leaving the event without a response
    pub fn take_result(&mut self) -> FetchResult {
        match self.response.take() {
            Some(response) => FetchResult::Response(response),
            None => FetchResult::Passthrough,
        }
    }
}

impl ExtendableEvent for FetchEvent {
    fn event_type(&self) -> EventType {
        EventType::Fetch
    }

    fn wait_until(&mut self, task: LifetimeTask) {
        self.extensions.push(task);
    }

    fn pending(&self) -> usize {
        self.extensions.len()
    }

    fn settle(&mut self) -> usize {
        self.extensions.run_all()
    }
}
