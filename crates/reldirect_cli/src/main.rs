/* 📖 # What does the reldirect binary do?

It runs the release download redirect in one of three ways:

1. `reldirect serve` starts the HTTP redirector and blocks until it stops
2. `reldirect resolve <PATH>` prints the response for one path as JSON
3. `reldirect event [FILE]` answers a serverless gateway event read from FILE or stdin

Configuration comes from `--config FILE`, or `reldirect.toml` in the current
directory when present, or built-in defaults. An explicit `--config` file must exist.

Exit codes:
- 0: Success
- 1: Error (bad configuration, unreadable event, server failure)
*/

use std::env;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reldirect_base::pal::http::HttpServerConfig;
use reldirect_base::tracing::init_tracing;
use reldirect_base::{FilePath, PalHandle, RealPal, ReldirectResult, ResultExt, err};
use reldirect_engine::{
    Config, DEFAULT_CONFIG_FILE, RedirectService, Resolver, ServerConfig, handle_event_json,
    load_config, load_config_or_default, response_to_json,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "reldirect", version, about = "Redirects release download paths to their assets")]
struct Cli {
    /// Configuration file (defaults to ./reldirect.toml if it exists)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve redirects over HTTP
    Serve {
        /// Address to bind, overrides the configuration
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on, overrides the configuration
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the response for a single request path
    Resolve {
        /// Request path, e.g. /releases/3.1.0/linux/amd64
        path: String,
    },
    /// Answer a gateway event JSON document
    Event {
        /// File holding the event, stdin when omitted
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = init_tracing().and_then(|()| {
        let current_dir = env::current_dir()
            .map_err(|e| err!("Failed to get current directory: {}", e))?;
        let pal = PalHandle::new(RealPal::new(current_dir));
        run(
            cli,
            &pal,
            &mut std::io::stdin().lock(),
            &mut std::io::stdout().lock(),
        )
    });
    ExitCode::from(exit_status(&result))
}

fn exit_status(result: &ReldirectResult<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            1
        }
    }
}

fn run(
    cli: Cli,
    pal: &PalHandle,
    stdin: &mut dyn Read,
    out: &mut dyn Write,
) -> ReldirectResult<()> {
    let config = load_cli_config(pal, cli.config.as_deref())?;
    let resolver = Resolver::new(config.release.clone());

    match cli.command {
        Command::Serve { host, port } => {
            let handle = pal
                .start_http_server(
                    Box::new(RedirectService::new(resolver)),
                    server_config(&config.server, host, port),
                )
                .context("Failed to start redirect server")?;
            info!(port = handle.port(), "redirecting release downloads");
            handle.wait()
        }
        Command::Resolve { path } => write_line(out, &response_to_json(&resolver.resolve(&path))?),
        Command::Event { file } => {
            let event = read_event(pal, file.as_deref(), stdin)?;
            write_line(out, &handle_event_json(&resolver, &event)?)
        }
    }
}

/// An explicit config file must load; the default one is optional.
fn load_cli_config(pal: &PalHandle, path: Option<&Path>) -> ReldirectResult<Config> {
    match path {
        Some(path) => load_config(pal, &FilePath::from(path)),
        None => load_config_or_default(pal, &FilePath::from(DEFAULT_CONFIG_FILE)),
    }
}

fn server_config(
    server: &ServerConfig,
    host: Option<String>,
    port: Option<u16>,
) -> HttpServerConfig {
    HttpServerConfig::new(host.unwrap_or_else(|| server.host.clone()))
        .with_port(port.unwrap_or(server.port))
}

fn read_event(
    pal: &PalHandle,
    file: Option<&Path>,
    stdin: &mut dyn Read,
) -> ReldirectResult<String> {
    match file {
        Some(path) => pal
            .read_file_to_string(&FilePath::from(path))
            .with_context(|| format!("Failed to read event file {}", path.display())),
        None => {
            let mut event = String::new();
            stdin
                .read_to_string(&mut event)
                .map_err(|e| err!("Failed to read event from stdin: {}", e))?;
            Ok(event)
        }
    }
}

fn write_line(out: &mut dyn Write, text: &str) -> ReldirectResult<()> {
    writeln!(out, "{}", text).map_err(|e| err!("Failed to write output: {}", e))
}
