use teloxide::Bot;

use crate::{
  config::Config, leveling::Engine, plugins::telegram::TelegramNotifier,
  prelude::*, store::Sql,
};

pub struct AppState {
  pub engine: Arc<Engine>,
  pub bot: Bot,
  pub config: Config,
}

impl AppState {
  pub async fn new(config: Config) -> Result<Self> {
    let token = config
      .bot_token
      .clone()
      .ok_or_else(|| Error::Config("TELOXIDE_TOKEN is not set".into()))?;
    let bot = Bot::new(token);

    let store = Sql::connect(&config.database_url).await?;
    let notifier = TelegramNotifier::new(bot.clone());
    let engine =
      Engine::new(Arc::new(store), Arc::new(notifier), &config.leveling)?;

    engine.seed_catalog().await?;

    Ok(Self::with_engine(Arc::new(engine), bot, config))
  }

  pub fn with_engine(engine: Arc<Engine>, bot: Bot, config: Config) -> Self {
    Self { engine, bot, config }
  }
}
