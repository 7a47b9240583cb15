use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UseCaseCategory {
    #[sea_orm(string_value = "Principal")]
    Principal,
    #[sea_orm(string_value = "Secondary")]
    Secondary,
    #[sea_orm(string_value = "Exceptional")]
    Exceptional,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UseCaseStatus {
    #[default]
    #[sea_orm(string_value = "Proposed")]
    Proposed,
    #[serde(rename = "In-Development")]
    #[sea_orm(string_value = "In-Development")]
    InDevelopment,
    #[sea_orm(string_value = "Implemented")]
    Implemented,
    #[sea_orm(string_value = "Validated")]
    Validated,
}

/// A use case of a project, optionally tracing back to one requirement.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "use_cases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: i32,
    pub requirement_id: Option<i32>,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Free-text, comma separated list of actor names.
    #[sea_orm(column_type = "Text", nullable)]
    pub actors: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub preconditions: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub postconditions: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub normal_flow: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub alternate_flow: Option<String>,
    pub category: UseCaseCategory,
    pub status: UseCaseStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::requirement::Entity",
        from = "Column::RequirementId",
        to = "super::requirement::Column::Id"
    )]
    Requirement,
    #[sea_orm(has_many = "super::scenario::Entity")]
    Scenario,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::requirement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requirement.def()
    }
}

impl Related<super::scenario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scenario.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
