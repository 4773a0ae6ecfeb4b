pub use std::{collections::HashMap, sync::Arc, time::Duration};

pub use anyhow::Context as _;
pub use async_trait::async_trait;
pub use chrono::{
  Datelike, NaiveDate as Date, NaiveDateTime as DateTime, TimeDelta, Timelike,
  Utc,
};
pub use dashmap::DashMap;
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection,
  EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
  TransactionTrait,
};
pub use tokio::time;
pub use tracing::{debug, error, info, warn};

pub use crate::entity::{Achievement, Category, UserAchievement, UserStats};
pub use crate::error::{Error, Result};
pub(crate) use crate::utils;
