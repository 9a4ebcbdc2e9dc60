//! minihttpd
//!
//! A minimal HTTP/1.1 server: one request per connection, a fixed route
//! table, and a flat directory of files.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ net::listener ──▶ http::server ──▶ http::request ──▶ routing
//!                (accept,          (session,         (bounded read,     (first
//!                 limit)            one exchange)     tokenize)          match)
//!                                                                          │
//!                                                                          ▼
//!   Client ◀── http::server ◀── http::response ◀── http::handlers ◀──── storage
//!               (write, close)    (wire bytes)      (root, echo, UA,     (fs / memory)
//!                                                     files)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use minihttpd::config::{read_config, validate_config, AcceptMode, ConfigError, ServerConfig};
use minihttpd::http::{HttpServer, ServerError};
use minihttpd::lifecycle::{signals, Shutdown};
use minihttpd::net::Listener;
use minihttpd::observability::{logging, metrics};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Sequential,
    Concurrent,
}

impl From<ModeArg> for AcceptMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => AcceptMode::Sequential,
            ModeArg::Concurrent => AcceptMode::Concurrent,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "minihttpd")]
#[command(about = "Minimal HTTP/1.1 echo and file server", long_about = None)]
struct Cli {
    /// Directory the /files routes read from and write to
    #[arg(long)]
    directory: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// Stop after serving this many connections
    #[arg(long)]
    capacity: Option<usize>,

    /// Maximum concurrent connections
    #[arg(long)]
    max_connections: Option<usize>,

    /// Serve connections one at a time or concurrently
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Layer command-line flags over the file (or default) configuration.
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(dir) = self.directory {
            config.storage.directory = Some(dir);
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(capacity) = self.capacity {
            config.listener.capacity = Some(capacity);
        }
        if let Some(max) = self.max_connections {
            config.listener.max_connections = max;
        }
        if let Some(mode) = self.mode {
            config.listener.mode = mode.into();
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        config
    }

    fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => read_config(path)?,
            None => ServerConfig::default(),
        };
        let config = self.apply(base);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("minihttpd: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);
    tracing::info!("minihttpd v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        capacity = ?config.listener.capacity,
        mode = ?config.listener.mode,
        directory = ?config.storage.directory,
        "Configuration loaded"
    );

    match run(config).await {
        Ok(served) => {
            tracing::info!(served, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<usize, ServerError> {
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    signals::spawn_ctrl_c_handler(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await
}
