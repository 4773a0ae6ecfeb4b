//! Database migrations using SeaORM

pub use sea_orm_migration::prelude::*;

mod m20260101_000001_create_user_stats;
mod m20260101_000002_create_achievements;
mod m20260101_000003_create_user_achievements;
mod m20260110_000004_add_activity_signals;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260101_000001_create_user_stats::Migration),
      Box::new(m20260101_000002_create_achievements::Migration),
      Box::new(m20260101_000003_create_user_achievements::Migration),
      Box::new(m20260110_000004_add_activity_signals::Migration),
    ]
  }
}
