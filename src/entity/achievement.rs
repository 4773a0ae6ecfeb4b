//! Achievement definitions, immutable once loaded

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone,
  Copy,
  Debug,
  PartialEq,
  Eq,
  Hash,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Category {
  #[sea_orm(string_value = "activity")]
  Activity,
  #[sea_orm(string_value = "media")]
  Media,
  #[sea_orm(string_value = "social")]
  Social,
  #[sea_orm(string_value = "rare")]
  Rare,
  #[sea_orm(string_value = "level")]
  Level,
}

impl Category {
  pub const ALL: [Category; 5] = [
    Category::Activity,
    Category::Media,
    Category::Social,
    Category::Rare,
    Category::Level,
  ];

  pub fn label(&self) -> &'static str {
    match self {
      Self::Activity => "Activity",
      Self::Media => "Media",
      Self::Social => "Social",
      Self::Rare => "Rare",
      Self::Level => "Levels",
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievements")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub title: String,
  pub description: String,
  pub emoji: String,
  /// tag resolved by the condition registry
  pub condition_type: String,
  pub condition_value: i64,
  pub category: Category,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::user_achievement::Entity")]
  Unlocks,
}

impl Related<super::user_achievement::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Unlocks.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
