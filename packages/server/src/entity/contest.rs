use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A contest; course periods are contests whose shortname carries the period
/// prefix (`week01`, `week02`, ...).
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contest")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub shortname: String,
    pub name: String,
    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,

    #[sea_orm(has_many)]
    pub scores: HasMany<super::scorecache::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
