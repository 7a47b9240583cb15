use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ScenarioKind {
    #[sea_orm(string_value = "Normal")]
    Normal,
    #[sea_orm(string_value = "Alternative")]
    Alternative,
    #[sea_orm(string_value = "Exception")]
    Exception,
}

/// A concrete walk-through of a use case.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scenarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub use_case_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub kind: ScenarioKind,
    #[sea_orm(column_type = "Text", nullable)]
    pub expected_result: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::use_case::Entity",
        from = "Column::UseCaseId",
        to = "super::use_case::Column::Id"
    )]
    UseCase,
}

impl Related<super::use_case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UseCase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
