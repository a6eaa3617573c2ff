use reldirect_base::{FilePath, PalHandle, ReldirectError, ReldirectResult, ResultExt};
use serde::Deserialize;
use tracing::{debug, info};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "reldirect.toml";

/// Configuration of the redirector. Every field has a default, so an empty file
/// describes the stock kubebuilder download redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub release: ReleaseConfig,
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Release host and naming of the published assets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Host serving `/{org}/{project}/releases/download/...`.
    pub host: String,
    pub org: String,
    pub project: String,
    /// Leading part of every asset file name.
    pub artifact_name: String,
    /// Path segment that must precede `{version}/{os}/{arch}`.
    pub path_prefix: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_string(),
            org: "kubernetes-sigs".to_string(),
            project: "kubebuilder".to_string(),
            artifact_name: "kubebuilder".to_string(),
            path_prefix: "releases".to_string(),
        }
    }
}

/// Parse configuration from TOML text.
pub fn parse_config(text: &str) -> ReldirectResult<Config> {
    toml::from_str(text)
        .map_err(|e| Box::new(ReldirectError::parse("configuration", e.message().to_string())))
}

/// Load configuration from a file, failing if it is missing or malformed.
pub fn load_config(pal: &PalHandle, path: &FilePath) -> ReldirectResult<Config> {
    debug!(%path, "loading configuration");
    let text = pal
        .read_file_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config = parse_config(&text).with_context(|| format!("Invalid config file {}", path))?;
    info!(%path, release_host = %config.release.host, "configuration loaded");
    Ok(config)
}

/// Load configuration if the file exists, defaults otherwise.
pub fn load_config_or_default(pal: &PalHandle, path: &FilePath) -> ReldirectResult<Config> {
    if pal.file_exists(path)? {
        load_config(pal, path)
    } else {
        debug!(%path, "no configuration file, using defaults");
        Ok(Config::default())
    }
}
