//! SeaORM entity definitions

pub mod achievement;
pub mod user_achievement;
pub mod user_stats;

pub use achievement::{Category, Model as Achievement};
pub use user_achievement::Model as UserAchievement;
pub use user_stats::Model as UserStats;
