use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rejudging")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub start_time: DateTimeUtc,
    pub end_time: Option<DateTimeUtc>,

    /// False once cancelled.
    #[sea_orm(default_value = true)]
    pub valid: bool,
    #[sea_orm(default_value = false)]
    pub applied: bool,

    #[sea_orm(has_many)]
    pub judgings: HasMany<super::judging::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
