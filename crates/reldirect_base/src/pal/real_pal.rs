use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::{ReldirectError, ReldirectResult, error::ErrorKind};

use super::FilePath;
use super::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService,
};
use super::traits::{Pal, utf8_contents};

/// How long the accept loop blocks before re-checking the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/* 📖 # Why tiny_http with a thread per request?

The redirector answers every request from memory, so a synchronous server without an
async runtime is plenty. The accept loop only hands requests over: each one is
answered on its own short-lived thread. tiny_http drains an unread request body when
the request is dropped, so a client announcing a large body and then stalling would
otherwise block every other client and the shutdown check with it. The loop polls
with recv_timeout so a shutdown is noticed without a connection arriving.
*/

/// PAL implementation backed by the real filesystem and tiny_http.
///
/// File paths are resolved relative to a configured base directory. Absolute paths
/// are used as they are.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> ReldirectResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.is_file();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file_to_string(&self, path: &FilePath) -> ReldirectResult<String> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "reading file");
        let bytes = fs::read(&resolved).map_err(|e| {
            debug!(error = %e, "failed to read file");
            Box::new(ReldirectError::new(ErrorKind::FileError {
                path: resolved,
                source: e,
            }))
        })?;
        utf8_contents(path, bytes)
    }

    #[instrument(skip(self, service), fields(address = %config.address()))]
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> ReldirectResult<HttpServerHandle> {
        let server = tiny_http::Server::http(config.address()).map_err(|e| {
            crate::err!("Failed to bind HTTP server to {}: {}", config.address(), e)
        })?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| crate::err!("HTTP server is not bound to an IP address"))?;
        info!(host = %config.host, port, "HTTP server listening");

        let handle = HttpServerHandle::new(port);
        let shutdown = Arc::clone(handle.shutdown_flag());
        let service: Arc<dyn HttpService> = Arc::from(service);
        let thread = std::thread::Builder::new()
            .name(format!("http-{}", port))
            .spawn(move || accept_loop(server, service, shutdown, port))
            .map_err(|e| crate::err!("Failed to spawn HTTP server thread: {}", e))?;
        Ok(handle.with_thread(thread))
    }
}

fn accept_loop(
    server: tiny_http::Server,
    service: Arc<dyn HttpService>,
    shutdown: Arc<AtomicBool>,
    port: u16,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(ACCEPT_POLL_INTERVAL) {
            Ok(Some(request)) => {
                let service = Arc::clone(&service);
                let spawned = std::thread::Builder::new()
                    .name(format!("http-{}-request", port))
                    .spawn(move || serve_request(service.as_ref(), request));
                if let Err(e) = spawned {
                    warn!(error = %e, "failed to spawn request thread, dropping request");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to receive HTTP request"),
        }
    }
    debug!("HTTP accept loop stopped");
}

fn serve_request(service: &dyn HttpService, raw: tiny_http::Request) {
    let request = HttpRequest::new(HttpMethod::from(raw.method().as_str()), raw.url());
    let method = request.method().clone();
    let path = request.path().to_string();
    let response = match service.handle_request(request) {
        Ok(response) => {
            debug!(%method, %path, status = response.status().as_u16(), "served request");
            response
        }
        Err(e) => {
            warn!(%method, %path, error = ?e, "service failed to handle request");
            HttpResponse::service_failure(e.to_string())
        }
    };
    if let Err(e) = raw.respond(convert_response(response)) {
        warn!(error = %e, "failed to write HTTP response");
    }
}

fn convert_response(response: HttpResponse) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let (status, headers, body) = response.into_parts();
    let mut converted =
        tiny_http::Response::from_data(body.into_bytes()).with_status_code(status.as_u16());
    for (name, value) in headers.iter() {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => converted.add_header(header),
            Err(()) => warn!(header = %name, "dropping header that is not valid ASCII"),
        }
    }
    converted
}
