use std::sync::Arc;

use async_trait::async_trait;

use crate::{prelude::*, state::AppState};

/// Periodic housekeeping of in-process engine state.
pub struct Plugin {
  pub every: Duration,
}

impl Default for Plugin {
  fn default() -> Self {
    Self { every: Duration::from_secs(60) }
  }
}

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "maintenance"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = time::interval(self.every);
    loop {
      interval.tick().await;
      app.engine.gc();

      let limited = app.engine.rate_limited();
      if limited > 0 {
        debug!(limited, "Rate limiter swept");
      }
    }
  }
}
