use migration::{Migrator, MigratorTrait};
use sea_orm::sea_query::OnConflict;
use sea_orm::{Condition, NotSet};

use super::{AchievementStore, Commit, StatsStore, Store};
use crate::entity::{achievement, user_achievement, user_stats};
use crate::prelude::*;

/// SeaORM-backed store.
#[derive(Debug, Clone)]
pub struct Sql {
  db: DatabaseConnection,
}

impl Sql {
  pub async fn connect(url: &str) -> Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(url).await?;

    info!("Running migrations...");
    Migrator::up(&db, None).await?;

    Ok(Self { db })
  }
}

fn changes(stats: &UserStats) -> user_stats::ActiveModel {
  user_stats::ActiveModel {
    user_id: NotSet,
    chat_id: NotSet,
    xp: Set(stats.xp),
    level: Set(stats.level),
    messages_count: Set(stats.messages_count),
    links_shared: Set(stats.links_shared),
    thanks_received: Set(stats.thanks_received),
    daily_messages: Set(stats.daily_messages),
    active_on: Set(stats.active_on),
    consecutive_days: Set(stats.consecutive_days),
    days_active: Set(stats.days_active),
    signals: Set(stats.signals.clone()),
    version: Set(stats.version + 1),
    last_activity: Set(stats.last_activity),
    created_at: NotSet,
    updated_at: Set(stats.updated_at),
  }
}

async fn write_stats<C: ConnectionTrait>(
  conn: &C,
  stats: &UserStats,
) -> Result<bool> {
  let res = user_stats::Entity::update_many()
    .set(changes(stats))
    .filter(user_stats::Column::UserId.eq(stats.user_id))
    .filter(user_stats::Column::ChatId.eq(stats.chat_id))
    .filter(user_stats::Column::Version.eq(stats.version))
    .exec(conn)
    .await?;

  Ok(res.rows_affected == 1)
}

async fn insert_unlock<C: ConnectionTrait>(
  conn: &C,
  record: &UserAchievement,
) -> Result<bool> {
  let model = user_achievement::ActiveModel {
    user_id: Set(record.user_id),
    chat_id: Set(record.chat_id),
    achievement_id: Set(record.achievement_id.clone()),
    unlocked_at: Set(record.unlocked_at),
  };

  let inserted = user_achievement::Entity::insert(model)
    .on_conflict(
      OnConflict::columns([
        user_achievement::Column::UserId,
        user_achievement::Column::ChatId,
        user_achievement::Column::AchievementId,
      ])
      .do_nothing()
      .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

  Ok(inserted > 0)
}

#[async_trait]
impl StatsStore for Sql {
  async fn get(&self, user_id: i64, chat_id: i64) -> Result<Option<UserStats>> {
    let stats =
      user_stats::Entity::find_by_id((user_id, chat_id)).one(&self.db).await?;
    Ok(stats)
  }

  async fn create(&self, user_id: i64, chat_id: i64) -> Result<UserStats> {
    let now = Utc::now().naive_utc();
    let fresh = UserStats::fresh(user_id, chat_id, now);

    let model = user_stats::ActiveModel {
      user_id: Set(user_id),
      chat_id: Set(chat_id),
      version: Set(fresh.version),
      created_at: Set(now),
      ..changes(&fresh)
    };

    user_stats::Entity::insert(model)
      .on_conflict(
        OnConflict::columns([
          user_stats::Column::UserId,
          user_stats::Column::ChatId,
        ])
        .do_nothing()
        .to_owned(),
      )
      .exec_without_returning(&self.db)
      .await?;

    self.get(user_id, chat_id).await?.ok_or_else(|| {
      Error::Internal(format!("stats for {user_id}@{chat_id} vanished"))
    })
  }

  async fn update(&self, stats: &UserStats) -> Result<bool> {
    write_stats(&self.db, stats).await
  }

  async fn leaderboard(
    &self,
    chat_id: i64,
    limit: u64,
  ) -> Result<Vec<UserStats>> {
    let rows = user_stats::Entity::find()
      .filter(user_stats::Column::ChatId.eq(chat_id))
      .order_by_desc(user_stats::Column::Xp)
      .order_by_desc(user_stats::Column::Level)
      .order_by_desc(user_stats::Column::MessagesCount)
      .order_by_asc(user_stats::Column::UserId)
      .limit(limit)
      .all(&self.db)
      .await?;
    Ok(rows)
  }

  async fn rank(&self, user_id: i64, chat_id: i64) -> Result<Option<u64>> {
    use user_stats::Column;

    let Some(stats) = self.get(user_id, chat_id).await? else {
      return Ok(None);
    };

    let ahead = Condition::any()
      .add(Column::Xp.gt(stats.xp))
      .add(
        Condition::all()
          .add(Column::Xp.eq(stats.xp))
          .add(Column::Level.gt(stats.level)),
      )
      .add(
        Condition::all()
          .add(Column::Xp.eq(stats.xp))
          .add(Column::Level.eq(stats.level))
          .add(Column::MessagesCount.gt(stats.messages_count)),
      );

    let count = user_stats::Entity::find()
      .filter(Column::ChatId.eq(chat_id))
      .filter(ahead)
      .count(&self.db)
      .await?;

    Ok(Some(count + 1))
  }
}

#[async_trait]
impl AchievementStore for Sql {
  async fn definitions(&self) -> Result<Vec<Achievement>> {
    Ok(achievement::Entity::find().all(&self.db).await?)
  }

  async fn upsert_definition(&self, def: &Achievement) -> Result<()> {
    use achievement::Column;

    let model = achievement::ActiveModel {
      id: Set(def.id.clone()),
      title: Set(def.title.clone()),
      description: Set(def.description.clone()),
      emoji: Set(def.emoji.clone()),
      condition_type: Set(def.condition_type.clone()),
      condition_value: Set(def.condition_value),
      category: Set(def.category),
    };

    achievement::Entity::insert(model)
      .on_conflict(
        OnConflict::column(Column::Id)
          .update_columns([
            Column::Title,
            Column::Description,
            Column::Emoji,
            Column::ConditionType,
            Column::ConditionValue,
            Column::Category,
          ])
          .to_owned(),
      )
      .exec_without_returning(&self.db)
      .await?;

    Ok(())
  }

  async fn has_unlock(
    &self,
    user_id: i64,
    chat_id: i64,
    achievement_id: &str,
  ) -> Result<bool> {
    let record = user_achievement::Entity::find_by_id((
      user_id,
      chat_id,
      achievement_id.to_string(),
    ))
    .one(&self.db)
    .await?;
    Ok(record.is_some())
  }

  async fn unlock(&self, record: &UserAchievement) -> Result<bool> {
    insert_unlock(&self.db, record).await
  }

  async fn unlocks(
    &self,
    user_id: i64,
    chat_id: i64,
  ) -> Result<Vec<UserAchievement>> {
    let records = user_achievement::Entity::find()
      .filter(user_achievement::Column::UserId.eq(user_id))
      .filter(user_achievement::Column::ChatId.eq(chat_id))
      .order_by_asc(user_achievement::Column::UnlockedAt)
      .all(&self.db)
      .await?;
    Ok(records)
  }
}

#[async_trait]
impl Store for Sql {
  async fn commit(
    &self,
    stats: &UserStats,
    unlocks: &[UserAchievement],
  ) -> Result<Commit> {
    let txn = self.db.begin().await?;

    if !write_stats(&txn, stats).await? {
      txn.rollback().await?;
      return Ok(Commit::Conflict);
    }

    let mut unlocked = Vec::new();
    for record in unlocks {
      if insert_unlock(&txn, record).await? {
        unlocked.push(record.achievement_id.clone());
      }
    }

    txn.commit().await?;
    Ok(Commit::Applied { unlocked })
  }
}
