use std::sync::Arc;

use chatxp::{
  config::Config,
  plugins::{self, App},
  prelude::*,
  state::AppState,
};
use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "chatxp=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  info!("Starting Chat XP v{}", env!("CARGO_PKG_VERSION"));

  let config = Config::from_env().context("Invalid configuration")?;
  let app = Arc::new(
    AppState::new(config).await.context("Failed to initialize state")?,
  );

  let handles = App::new()
    .register(plugins::telegram::Plugin)
    .register(plugins::server::Plugin)
    .register(plugins::maintenance::Plugin::default())
    .run(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
  info!("Shutting down...");

  for handle in handles {
    handle.abort();
  }

  Ok(())
}
