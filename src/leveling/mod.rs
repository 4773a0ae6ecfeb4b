//! XP and achievement engine
//!
//! Events come in as [`MessageEvent`]/[`ReactionEvent`], get turned into
//! per-member deltas, and every member's stats row is committed atomically
//! together with the achievements the new state unlocks.

pub mod analyzer;
pub mod catalog;
pub mod condition;
pub mod engine;
pub mod event;
pub mod levels;
pub mod limiter;
pub mod tracker;
pub mod xp;

pub use catalog::Catalog;
pub use condition::{ConditionRegistry, Context, Flag, Signal};
pub use engine::{Engine, Profile, Unlocked};
pub use event::{
  ChatKind, LevelUp, Media, Member, MessageEvent, Origin, ReactionEvent,
  Report, Skip, XpGain,
};
pub use levels::{LevelModel, Progress};
pub use limiter::RateLimiter;
pub use tracker::ChatTracker;
pub use xp::XpRule;
