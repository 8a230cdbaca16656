//! EmberKV - An In-Memory Key-Value Cache
//!
//! This is the main entry point for the EmberKV server.
//! It parses the command line, loads the configuration, sets up logging and
//! runs the server until Ctrl+C.

use clap::Parser;
use emberkv::config::ServerConfig;
use emberkv::server::Server;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "emberkv", version, about = "An in-memory key-value cache")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, env = "EMBERKV_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn load_config(cli: &Cli) -> ServerConfig {
    let mut config = match &cli.config {
        Some(path) => match ServerConfig::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "Config loaded");
                config
            }
            Err(e) => {
                error!(error = %e, "Error loading config, using defaults");
                ServerConfig::default()
            }
        },
        None => ServerConfig::default(),
    };

    if let Some(port) = cli.port {
        config.port = port;
    }
    config
}

fn print_banner(config: &ServerConfig) {
    println!(
        r#"
  ___        _             _  ____   __
 | __|_ __  | |__  ___ _ _| |/ /\ \ / /
 | _|| '  \ | '_ \/ -_) '_| ' <  \ V /
 |___|_|_|_||_.__/\___|_| |_|\_\  \_/

EmberKV v{} - In-Memory Key-Value Cache
──────────────────────────────────────────────────────────────
Server starting on {}
Authorization: {}

Use Ctrl+C to shutdown gracefully.
"#,
        emberkv::VERSION,
        config.bind_address(),
        if config.authorization { "on" } else { "off" },
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = load_config(&cli);
    print_banner(&config);

    Server::new(config).run().await?;
    Ok(())
}
