/* 📖 # Why a dedicated HTTP module in the PAL?

The redirector is a single HTTP service. Describing requests and responses with our
own small types keeps the engine independent of tiny_http and lets MockPal feed
requests to a service in-process.

A request carries only what the redirector routes on: the method and the raw target.
Headers and bodies are never read, so a client cannot hold a worker hostage by
trickling a large upload.
*/

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::ReldirectResult;

/// Request method. Methods without a dedicated variant are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Other(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Other(method) => method,
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "OPTIONS" => Self::Options,
            _ => Self::Other(method.to_string()),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response headers, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders(BTreeMap<String, String>);

impl HttpHeaders {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl From<BTreeMap<String, String>> for HttpHeaders {
    fn from(headers: BTreeMap<String, String>) -> Self {
        Self(headers)
    }
}

/// Response body bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpBody(Vec<u8>);

impl HttpBody {
    /// Content as a string, if it is valid UTF-8.
    pub fn as_string(&self) -> Option<String> {
        String::from_utf8(self.0.clone()).ok()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for HttpBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<String> for HttpBody {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl From<&str> for HttpBody {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

/// Inbound request as seen by an HttpService.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    target: String,
}

impl HttpRequest {
    /// `target` is the raw request target, query included.
    pub fn new(method: HttpMethod, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
        }
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.target
    }
}

/// Numeric status code of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusCode(u16);

impl HttpStatusCode {
    pub const FOUND: Self = Self(302);
    pub const NOT_FOUND: Self = Self(404);
    /// Sent by the PAL when a service fails instead of producing a response.
    pub const SERVICE_FAILURE: Self = Self(599);

    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// Response produced by an HttpService.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: HttpStatusCode,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpResponse {
    pub fn new(status: HttpStatusCode) -> Self {
        Self {
            status,
            headers: HttpHeaders::default(),
            body: HttpBody::default(),
        }
    }

    /// Plain text 599 response carrying a service error message.
    pub fn service_failure(message: impl Into<String>) -> Self {
        Self::new(HttpStatusCode::SERVICE_FAILURE)
            .with_header("content-type", "text/plain")
            .with_body(message.into())
    }

    pub fn status(&self) -> HttpStatusCode {
        self.status
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    pub fn into_parts(self) -> (HttpStatusCode, HttpHeaders, HttpBody) {
        (self.status, self.headers, self.body)
    }

    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: impl Into<HttpHeaders>) -> Self {
        self.headers = headers.into();
        self
    }
}

/// Where an HTTP server binds.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    /// `None` lets the OS pick a free port.
    pub port: Option<u16>,
}

impl HttpServerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Bind address, `host:0` when the port is OS-assigned.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(0))
    }
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1")
    }
}

/// Application side of an HTTP server. The service owns all routing.
pub trait HttpService: std::fmt::Debug + Send + Sync + 'static {
    /// Errors are turned into 599 responses by the PAL, so they stay distinguishable
    /// from responses the service chose.
    fn handle_request(&self, request: HttpRequest) -> ReldirectResult<HttpResponse>;
}

/// Handle to a running HTTP server.
///
/// Clones share the server. The server stops once `shutdown()` is called or the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct HttpServerHandle {
    port: u16,
    shutdown: Arc<AtomicBool>,
    accept_thread: Arc<Mutex<Option<JoinHandle<()>>>>,
    owners: Arc<()>,
}

impl HttpServerHandle {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            shutdown: Arc::new(AtomicBool::new(false)),
            accept_thread: Arc::new(Mutex::new(None)),
            owners: Arc::new(()),
        }
    }

    /// Attach the thread running the accept loop so that `wait()` can join it.
    pub fn with_thread(self, thread: JoinHandle<()>) -> Self {
        *self.accept_thread.lock() = Some(thread);
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Flag polled by the implementation to notice a shutdown.
    pub fn shutdown_flag(&self) -> &Arc<AtomicBool> {
        &self.shutdown
    }

    /// Block until the accept loop exits. Returns at once for servers without a
    /// thread (MockPal) or when another clone already waited.
    pub fn wait(&self) -> ReldirectResult<()> {
        let thread = self.accept_thread.lock().take();
        if let Some(thread) = thread {
            thread
                .join()
                .map_err(|_| crate::err!("HTTP server thread on port {} panicked", self.port))?;
        }
        Ok(())
    }
}

impl Drop for HttpServerHandle {
    fn drop(&mut self) {
        if Arc::strong_count(&self.owners) == 1 {
            self.shutdown();
        }
    }
}
