use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Achievements::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Achievements::Id).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(Achievements::Title).string().not_null())
          .col(ColumnDef::new(Achievements::Description).string().not_null())
          .col(ColumnDef::new(Achievements::Emoji).string().not_null())
          .col(ColumnDef::new(Achievements::ConditionType).string().not_null())
          .col(
            ColumnDef::new(Achievements::ConditionValue)
              .big_integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(Achievements::Category)
              .string()
              .not_null()
              .default("activity"),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Achievements::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Achievements {
  Table,
  Id,
  Title,
  Description,
  Emoji,
  ConditionType,
  ConditionValue,
  Category,
}
