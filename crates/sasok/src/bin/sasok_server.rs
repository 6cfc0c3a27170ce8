//! SASOK REST Server
//!
//! Serves the placeholder frontend routes and the analysis pipeline.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use sasok::config::Config;
use sasok::server::startup::start_server;

#[derive(Parser)]
#[command(name = "sasok_server")]
#[command(about = "SASOK REST API Server")]
#[command(version)]
struct Args {
  /// Server bind address (overrides the config file)
  #[arg(long, env = "SASOK_BIND")]
  bind: Option<SocketAddr>,

  /// Path to a JSON config file
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // ort and tokenizers are chatty at info
  let filter = if args.verbose {
    EnvFilter::new("debug,ort=warn,tokenizers=warn,hyper=info")
  } else {
    EnvFilter::new("sasok=info,journal=info,tower_http=warn,ort=error,warn")
  };
  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(bind) = args.bind {
    config.server.bind = bind;
  }

  tracing::info!("Starting SASOK REST Server v{}", env!("CARGO_PKG_VERSION"));
  tracing::info!("Binding to address: {}", config.server.bind);

  start_server(config).await
}
