use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use parking_lot::Mutex;

use crate::ReldirectError;
use crate::ReldirectResult;
use crate::error::ErrorKind;

use super::FilePath;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::{Pal, utf8_contents};

/* 📖 # Why does MockPal keep services instead of listening?

Tests of the redirect service want the full request/response conversion without
binding ports. MockPal stores each started service under a fake port and
simulate_request() calls it synchronously, as a request thread of RealPal would.
A service is only reachable while its server runs: once the handle is shut down or
its last clone dropped, the port is free again.
*/

#[derive(Debug)]
struct MockServer {
    service: Box<dyn HttpService>,
    shutdown: Arc<AtomicBool>,
}

impl MockServer {
    fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst)
    }
}

/// In-memory PAL implementation for testing.
///
/// ```
/// use reldirect_base::{FilePath, MockPal, Pal};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("reldirect.toml"), b"[server]".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("reldirect.toml")).unwrap();
/// assert_eq!(content, "[server]");
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    servers: Arc<Mutex<HashMap<u16, MockServer>>>,
    next_port: Arc<AtomicU16>,
}

impl MockPal {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
        }
    }

    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        self.files.lock().insert(path, content);
    }

    /// Send a request to the server running on `port`.
    ///
    /// Service errors become 599 responses, as with RealPal.
    pub fn simulate_request(
        &self,
        port: u16,
        request: HttpRequest,
    ) -> ReldirectResult<HttpResponse> {
        let servers = self.servers.lock();
        let server = servers
            .get(&port)
            .filter(|server| server.is_running())
            .ok_or_else(|| crate::err!("No HTTP server running on port {}", port))?;

        Ok(server
            .service
            .handle_request(request)
            .unwrap_or_else(|e| HttpResponse::service_failure(e.to_string())))
    }

    /// Number of servers that have not been shut down.
    pub fn running_servers(&self) -> usize {
        self.servers
            .lock()
            .values()
            .filter(|server| server.is_running())
            .count()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> ReldirectResult<bool> {
        Ok(self.files.lock().contains_key(path))
    }

    fn read_file_to_string(&self, path: &FilePath) -> ReldirectResult<String> {
        let content = self.files.lock().get(path).cloned().ok_or_else(|| {
            Box::new(ReldirectError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ),
            }))
        })?;
        utf8_contents(path, content)
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> ReldirectResult<HttpServerHandle> {
        let mut servers = self.servers.lock();
        servers.retain(|_, server| server.is_running());
        let port = match config.port {
            Some(port) => port,
            None => self.next_port.fetch_add(1, Ordering::SeqCst),
        };
        if servers.contains_key(&port) {
            return Err(crate::err!("Port {} is already in use", port));
        }
        let handle = HttpServerHandle::new(port);
        servers.insert(
            port,
            MockServer {
                service,
                shutdown: Arc::clone(handle.shutdown_flag()),
            },
        );
        Ok(handle)
    }
}
