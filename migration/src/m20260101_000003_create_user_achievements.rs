use sea_orm_migration::prelude::*;

use super::m20260101_000002_create_achievements::Achievements;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(UserAchievements::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(UserAchievements::UserId).big_integer().not_null(),
          )
          .col(
            ColumnDef::new(UserAchievements::ChatId).big_integer().not_null(),
          )
          .col(
            ColumnDef::new(UserAchievements::AchievementId).string().not_null(),
          )
          .col(
            ColumnDef::new(UserAchievements::UnlockedAt).date_time().not_null(),
          )
          .primary_key(
            Index::create()
              .col(UserAchievements::UserId)
              .col(UserAchievements::ChatId)
              .col(UserAchievements::AchievementId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_achievements_achievement")
              .from(UserAchievements::Table, UserAchievements::AchievementId)
              .to(Achievements::Table, Achievements::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_user_achievements_member")
          .table(UserAchievements::Table)
          .col(UserAchievements::UserId)
          .col(UserAchievements::ChatId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(UserAchievements::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum UserAchievements {
  Table,
  UserId,
  ChatId,
  AchievementId,
  UnlockedAt,
}
