use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(UserStats::Table)
          .if_not_exists()
          .col(ColumnDef::new(UserStats::UserId).big_integer().not_null())
          .col(ColumnDef::new(UserStats::ChatId).big_integer().not_null())
          .col(
            ColumnDef::new(UserStats::Xp).big_integer().not_null().default(0),
          )
          .col(ColumnDef::new(UserStats::Level).integer().not_null().default(1))
          .col(
            ColumnDef::new(UserStats::MessagesCount)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserStats::LinksShared)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserStats::ThanksReceived)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserStats::DailyMessages)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(UserStats::ActiveOn).date().null())
          .col(
            ColumnDef::new(UserStats::ConsecutiveDays)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserStats::DaysActive)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserStats::Version)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(UserStats::LastActivity).date_time().null())
          .col(ColumnDef::new(UserStats::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(UserStats::UpdatedAt).date_time().not_null())
          .primary_key(
            Index::create().col(UserStats::UserId).col(UserStats::ChatId),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_user_stats_chat_xp")
          .table(UserStats::Table)
          .col(UserStats::ChatId)
          .col(UserStats::Xp)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(UserStats::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum UserStats {
  Table,
  UserId,
  ChatId,
  Xp,
  Level,
  MessagesCount,
  LinksShared,
  ThanksReceived,
  DailyMessages,
  ActiveOn,
  ConsecutiveDays,
  DaysActive,
  Version,
  LastActivity,
  CreatedAt,
  UpdatedAt,
}
