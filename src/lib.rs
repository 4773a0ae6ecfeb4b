//! Chat XP - levels and achievements for group chats
//!
//! Architecture:
//! - `leveling` holds the engine: XP rules, level curve, achievement
//!   conditions and the per-member commit loop
//! - `store` persists stats and unlocks (SeaORM over SQLite, or in memory)
//! - `notify` announces level-ups and achievements
//! - `plugins` wire the engine to Telegram (Teloxide) and HTTP (Axum)

pub mod config;
pub mod entity;
pub mod error;
pub mod leveling;
pub mod notify;
pub mod plugins;
pub mod prelude;
pub mod state;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use leveling::Engine;
