use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sasok::cli::client::{ClientConfig, SasokClient, DEFAULT_SERVER_URL};
use sasok::cli::commands;

#[derive(Parser)]
#[command(name = "sasok")]
#[command(about = "SASOK - emotion and intent analysis client\nTalks to a running sasok_server")]
#[command(version)]
struct Cli {
  /// Base URL of the SASOK server
  #[arg(long, env = "SASOK_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
  server: String,

  /// Request timeout in seconds
  #[arg(long, env = "SASOK_TIMEOUT_SECS", default_value = "60")]
  timeout: u64,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Check that the server is up
  Health,
  /// Show component status and learning statistics
  Status,
  /// Analyse the emotion and intent of a piece of text
  Text {
    /// Text to analyse
    text: String,
  },
  /// Detect faces in an image and classify their emotions
  Image {
    /// PNG or JPEG file
    path: PathBuf,
  },
  /// Like `image`, but also write a copy with the detected faces boxed
  Annotate {
    /// PNG or JPEG file
    input: PathBuf,
    /// Where to write the annotated image
    output: PathBuf,
  },
  /// Submit feedback (a JSON object) for retraining
  Feedback {
    /// e.g. '{"interaction_id": "...", "correct_emotion": "happy"}'
    json: String,
  },
  /// Trigger a training pass over the collected data
  Train,
  /// Query server logs for debugging and monitoring
  Logs {
    /// Maximum number of log entries to return
    #[arg(short, long, default_value = "50")]
    limit: usize,
    /// Filter by log level (debug, info, success, warn, error, all)
    #[arg(long, default_value = "all")]
    level: String,
  },
}

async fn handle(client: &SasokClient, command: Command) -> Result<()> {
  match command {
    Command::Health => commands::health(client).await,
    Command::Status => commands::status(client).await,
    Command::Text { text } => commands::text(client, &text).await,
    Command::Image { path } => commands::image(client, &path).await,
    Command::Annotate { input, output } => commands::annotate(client, &input, &output).await,
    Command::Feedback { json } => commands::feedback(client, &json).await,
    Command::Train => commands::train(client).await,
    Command::Logs { limit, level } => commands::logs(client, limit, &level).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let client = SasokClient::with_config(ClientConfig { base_url: cli.server, timeout_secs: cli.timeout })?;
  handle(&client, cli.command).await
}
