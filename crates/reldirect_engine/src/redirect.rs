/* 📖 # How are release download paths resolved?

Installers fetch `/releases/{version}/{os}/{arch}` and expect to be sent to the
matching GitHub release asset. Only the last four path segments are looked at, so
any mount point or gateway stage in front of them is ignored:

    /stage/releases/2.3.1/windows/amd64
           ^^^^^^^^ ^^^^^ ^^^^^^^ ^^^^^
           prefix   ver   os      arch

The asset name depends on the release line the version belongs to. Releases 1.x and
2.x were published as tarballs with the version in the file name, later releases
as bare binaries. The line is decided by the *first character* of the version,
compared as a character: `10.0.0` starts with `1` and therefore counts as a
tarball release. This mirrors the behaviour installers already depend on.

Anything that does not fit the pattern gets a 404 page that embeds the parsed
segments as JSON, so bug reports carry everything needed to reproduce them.
*/

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::ReleaseConfig;

pub const CONTENT_TYPE: &str = "content-type";
pub const LOCATION: &str = "location";

/// Path segments of an inbound request, taken from the end of the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRequest {
    raw_path: String,
    prefix: Option<String>,
    version: Option<String>,
    os: Option<String>,
    arch: Option<String>,
}

impl RedirectRequest {
    /// Split a URL path on `/` and keep the last four segments.
    pub fn from_path(path: &str) -> Self {
        Self::from_segments(path, path.split('/'))
    }

    /// Build a request from already split segments. Missing leading segments stay
    /// absent.
    pub fn from_segments<'a>(
        raw_path: impl Into<String>,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let segments: Vec<&str> = segments.into_iter().collect();
        let tail = &segments[segments.len().saturating_sub(4)..];
        let missing = 4 - tail.len();
        let mut fields = std::iter::repeat_n(None, missing)
            .chain(tail.iter().map(|segment| Some(segment.to_string())));
        Self {
            raw_path: raw_path.into(),
            prefix: fields.next().flatten(),
            version: fields.next().flatten(),
            os: fields.next().flatten(),
            arch: fields.next().flatten(),
        }
    }

    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn os(&self) -> Option<&str> {
        self.os.as_deref()
    }

    pub fn arch(&self) -> Option<&str> {
        self.arch.as_deref()
    }

    /// Returns the validated release coordinates, or None if the request does not
    /// name a release under `expected_prefix`.
    pub fn release(&self, expected_prefix: &str) -> Option<ReleaseCoordinates<'_>> {
        if self.prefix.as_deref() != Some(expected_prefix) {
            return None;
        }
        Some(ReleaseCoordinates {
            version: non_empty(&self.version)?,
            os: non_empty(&self.os)?,
            arch: non_empty(&self.arch)?,
        })
    }

    fn debug_record(&self) -> DebugRecord<'_> {
        DebugRecord {
            version: self.version(),
            os: self.os(),
            arch: self.arch(),
            prefix: self.prefix(),
            raw_path: &self.raw_path,
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Version and platform of a well-formed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseCoordinates<'a> {
    pub version: &'a str,
    pub os: &'a str,
    pub arch: &'a str,
}

/// Release line a version belongs to, deciding the shape of the asset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionEpoch {
    /// `<name>_<version>_<os>_<arch>.tar.gz`
    LegacyTarball,
    /// `<name>_<os>_<arch>`
    CurrentBinary,
}

impl VersionEpoch {
    /// Classify by the first character only: `'1'` and `'2'` are legacy.
    pub fn classify(version: &str) -> Self {
        match version.chars().next() {
            Some('1') | Some('2') => Self::LegacyTarball,
            _ => Self::CurrentBinary,
        }
    }
}

/// Response in the shape expected by serverless HTTP gateways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RedirectResponse {
    fn found(location: String) -> Self {
        let body = format!("Redirecting to {}", location);
        let headers = BTreeMap::from([
            (CONTENT_TYPE.to_string(), "text/plain".to_string()),
            (LOCATION.to_string(), location),
        ]);
        Self {
            status_code: 302,
            headers,
            body,
        }
    }

    fn not_found(body: String) -> Self {
        Self {
            status_code: 404,
            headers: BTreeMap::from([(CONTENT_TYPE.to_string(), "text/html".to_string())]),
            body,
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).map(String::as_str)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugRecord<'a> {
    version: Option<&'a str>,
    os: Option<&'a str>,
    arch: Option<&'a str>,
    prefix: Option<&'a str>,
    raw_path: &'a str,
}

/// Resolves request paths against one release host and project.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    release: ReleaseConfig,
}

impl Resolver {
    pub fn new(release: ReleaseConfig) -> Self {
        Self { release }
    }

    pub fn release_config(&self) -> &ReleaseConfig {
        &self.release
    }

    pub fn resolve(&self, path: &str) -> RedirectResponse {
        self.resolve_request(&RedirectRequest::from_path(path))
    }

    pub fn resolve_request(&self, request: &RedirectRequest) -> RedirectResponse {
        match request.release(&self.release.path_prefix) {
            Some(release) => {
                let location = self.download_url(release);
                debug!(path = request.raw_path(), %location, "redirecting to release asset");
                RedirectResponse::found(location)
            }
            None => {
                debug!(path = request.raw_path(), "path does not name a release");
                RedirectResponse::not_found(render_not_found(request))
            }
        }
    }

    /// File name of the release asset for the given coordinates.
    pub fn artifact_filename(&self, release: ReleaseCoordinates<'_>) -> String {
        let name = &self.release.artifact_name;
        let ReleaseCoordinates { version, os, arch } = release;
        match VersionEpoch::classify(version) {
            VersionEpoch::LegacyTarball => format!("{name}_{version}_{os}_{arch}.tar.gz"),
            VersionEpoch::CurrentBinary => format!("{name}_{os}_{arch}"),
        }
    }

    pub fn download_url(&self, release: ReleaseCoordinates<'_>) -> String {
        let ReleaseConfig {
            host, org, project, ..
        } = &self.release;
        format!(
            "https://{host}/{org}/{project}/releases/download/v{}/{}",
            release.version,
            self.artifact_filename(release)
        )
    }
}

/// Resolve a path with the default release target.
pub fn resolve(path: &str) -> RedirectResponse {
    Resolver::default().resolve(path)
}

fn render_not_found(request: &RedirectRequest) -> String {
    // Serializing borrowed strings into a String cannot fail.
    let record = serde_json::to_string(&request.debug_record()).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Release not found</title></head>
<body>
<h1>Release not found</h1>
<p>Downloads are served from paths of the form <code>/releases/{{version}}/{{os}}/{{arch}}</code>. If you followed a link from the documentation, please file a bug and include the details below.</p>
<details>
<summary>Debug information</summary>
<pre><code>{}</code></pre>
</details>
</body>
</html>
"#,
        escape_html(&record)
    )
}

/// Escape the characters that could close the surrounding markup. Quotes are left
/// alone so the embedded JSON stays readable.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}
