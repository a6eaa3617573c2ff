use std::sync::Arc;

use crate::ReldirectResult;

use super::file_path::FilePath;
use super::http::{HttpServerConfig, HttpServerHandle, HttpService};

/* 📖 # Why is Pal a trait instead of a struct?

Code that loads configuration, reads events or starts the server depends on this
abstraction, not on std::fs or tiny_http directly. RealPal is used by the binary,
MockPal by tests that need deterministic files and in-process HTTP requests.
*/

/// Platform Abstraction Layer: file access and HTTP serving.
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    fn file_exists(&self, path: &FilePath) -> ReldirectResult<bool>;

    /// Read a whole file as UTF-8 text.
    ///
    /// A missing or unreadable file is a `FileError`; invalid UTF-8 is a message error
    /// naming the path.
    fn read_file_to_string(&self, path: &FilePath) -> ReldirectResult<String>;

    /// Start an HTTP server with the given service.
    ///
    /// The server listens immediately. It stops once the last clone of the returned
    /// handle is dropped or `shutdown()` is called.
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> ReldirectResult<HttpServerHandle>;
}

/// Shared handle to a PAL implementation.
///
/// ```no_run
/// use reldirect_base::{PalHandle, RealPal};
///
/// let pal = PalHandle::new(RealPal::new(".".into()));
/// let pal_clone = pal.clone();
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    pub fn new(pal: impl Pal) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

/// Converts raw file bytes to text, naming the file when they are not UTF-8.
pub(crate) fn utf8_contents(path: &FilePath, bytes: Vec<u8>) -> ReldirectResult<String> {
    String::from_utf8(bytes).map_err(|_| crate::err!("File is not valid UTF-8: {}", path))
}
