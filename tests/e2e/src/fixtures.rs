//! Test fixtures and data factories
//!
//! Provides a scripted network and canned АСУБТ responses.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};
use hashbrown::HashMap;
use spin::Mutex;

use asubt_runtime::service_worker::{Network, NetworkError, Request, Response};

/// Scripted network.
///
/// Routes map absolute URLs to responses; unknown URLs get a 404. Every
/// call is recorded, including calls made while offline.
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeNetwork {
    /// Create an online network with no routes
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Network serving the АСУБТ shell and a few assets under `origin`
    pub fn asubt(origin: &str) -> Self {
        let net = Self::new();
        net.route(&format!("{}/", origin), AppFixtures::shell_response("/"));
        net.route(
            &format!("{}/index.html", origin),
            AppFixtures::shell_response("/index.html"),
        );
        net.route(
            &format!("{}/assets/index.js", origin),
            Response::new(200)
                .with_header("Content-Type", "application/javascript")
                .with_body(&b"console.log('asubt')"[..]),
        );
        net.route(AppFixtures::FONT_URL, AppFixtures::font_response());
        net.route(
            AppFixtures::FONT_CSS_URL,
            Response::new(200)
                .with_header("Content-Type", "text/css")
                .with_body(&b"@font-face{font-family:Inter}"[..]),
        );
        net
    }

    /// Serve `response` for `url`
    pub fn route(&self, url: &str, response: Response) {
        self.routes.lock().insert(url.to_string(), response);
    }

    /// Cut connectivity
    pub fn go_offline(&self) {
        self.online.store(false, Ordering::SeqCst);
    }

    /// Restore connectivity
    pub fn go_online(&self) {
        self.online.store(true, Ordering::SeqCst);
    }

    /// URLs fetched so far, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of fetches for `url`
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|u| *u == url).count()
    }

    /// Total number of fetches
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for FakeNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Network for FakeNetwork {
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.lock().push(request.url.clone());
        if !self.online.load(Ordering::SeqCst) {
            return Err(NetworkError::Offline);
        }
        let response = self
            .routes
            .lock()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Response::new(404).with_body(&b"Not Found"[..]));
        Ok(response.with_url(request.url.clone()))
    }
}

/// АСУБТ fixtures
pub struct AppFixtures;

impl AppFixtures {
    /// Origin the client is served from
    pub const ORIGIN: &'static str = "https://asubt.poehali.dev";

    /// Web font binary
    pub const FONT_URL: &'static str = "https://fonts.gstatic.com/s/inter/v13/font.woff2";

    /// Web font stylesheet
    pub const FONT_CSS_URL: &'static str = "https://fonts.googleapis.com/css2?family=Inter";

    /// Remote function endpoint used by the ПАБ pages
    pub const API_URL: &'static str = "https://functions.poehali.dev/pab-audits";

    /// Absolute URL under the fixture origin
    pub fn url(path: &str) -> String {
        format!("{}{}", Self::ORIGIN, path)
    }

    /// Application shell document
    pub fn shell_html() -> String {
        String::from(
            r#"<!DOCTYPE html>
<html lang="ru">
<head>
    <meta charset="UTF-8">
    <title>АСУБТ</title>
    <script type="module" src="/assets/index.js"></script>
</head>
<body>
    <div id="root"></div>
</body>
</html>"#,
        )
    }

    /// Shell response as served for `path`
    pub fn shell_response(path: &str) -> Response {
        Response::new(200)
            .with_header("Content-Type", "text/html; charset=utf-8")
            .with_header("X-Shell-Path", path)
            .with_body(Self::shell_html().into_bytes())
    }

    /// Font bytes
    pub fn font_response() -> Response {
        Response::new(200)
            .with_header("Content-Type", "font/woff2")
            .with_header("Cache-Control", "public, max-age=31536000")
            .with_body(&[0x77u8, 0x4f, 0x46, 0x32, 0x00, 0x01, 0x00, 0x00][..])
    }

    /// JSON list returned by the audits endpoint
    pub fn audits_json() -> Response {
        Response::new(200)
            .with_header("Content-Type", "application/json")
            .with_body(&br#"{"audits":[{"id":1,"status":"open"}]}"#[..])
    }
}
