pub mod api;
pub mod config;
pub mod event;
pub mod redirect;

pub use api::RedirectService;
pub use config::{
    Config, DEFAULT_CONFIG_FILE, ReleaseConfig, ServerConfig, load_config, load_config_or_default,
};
pub use event::{GatewayEvent, handle_event, handle_event_json, response_to_json};
pub use redirect::{
    RedirectRequest, RedirectResponse, ReleaseCoordinates, Resolver, VersionEpoch, resolve,
};
