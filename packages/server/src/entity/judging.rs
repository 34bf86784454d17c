use common::JudgingResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "judging")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub submission_id: i32,
    pub contest_id: i32,

    pub start_time: DateTimeUtc,
    /// NULL while the judging is running.
    pub end_time: Option<DateTimeUtc>,
    pub result: JudgingResult,

    #[sea_orm(default_value = false)]
    pub verified: bool,
    pub jury_member: Option<String>,
    pub verify_comment: Option<String>,

    /// False once superseded or abandoned.
    #[sea_orm(default_value = true, indexed)]
    pub valid: bool,
    #[sea_orm(default_value = false)]
    pub seen: bool,

    pub judgehost: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub compile_output: Option<String>,

    pub rejudging_id: Option<i32>,
    #[sea_orm(belongs_to, from = "rejudging_id", to = "id")]
    pub rejudging: HasOne<super::rejudging::Entity>,

    /// Judging superseded by this one. Not a foreign key.
    pub original_judging_id: Option<i32>,

    #[sea_orm(has_many)]
    pub runs: HasMany<super::judging_run::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
