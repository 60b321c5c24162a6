use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use tango::api::{HttpGateway, MemoryGateway, WordbookGateway};
use tango::app::App;
use tango::auth::{EnvTokenProvider, StaticTokenProvider, TokenProvider};
use tango::config::Config;
use tango::store::Stores;

#[derive(Parser, Debug)]
#[command(name = "tango")]
#[command(about = "A terminal UI for vocabulary wordbooks")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/tango/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Run against an in-memory gateway with sample data (no server, no token)
  #[arg(long)]
  offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // The terminal belongs to the TUI; logs go to a file.
  let _log_guard = init_tracing()?;

  let (config, gateway, tokens): (_, Arc<dyn WordbookGateway>, Arc<dyn TokenProvider>) =
    if args.offline {
      (
        Config::offline(),
        Arc::new(MemoryGateway::with_sample_data()),
        StaticTokenProvider::signed_in(),
      )
    } else {
      let config = Config::load(args.config.as_deref())?;
      let gateway = HttpGateway::new(config.api_base_url()?);
      (config, Arc::new(gateway), Arc::new(EnvTokenProvider))
    };

  let stores = Stores::new(gateway, tokens);

  // Initialize and run the app
  let mut app = App::new(config, stores);
  app.run().await?;

  Ok(())
}

fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("tango");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::never(log_dir, "tango.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_env("TANGO_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
