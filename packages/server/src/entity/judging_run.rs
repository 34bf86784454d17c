use common::JudgingResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "judging_run")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "judging_testcase")]
    pub judging_id: i32,
    #[sea_orm(unique_key = "judging_testcase")]
    pub testcase_rank: i32,

    pub result: JudgingResult,
    pub runtime: f64, // in seconds

    #[sea_orm(belongs_to, from = "judging_id", to = "id")]
    pub judging: HasOne<super::judging::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
