use super::{requirement, use_case};
use sea_orm::entity::prelude::*;

/// Join table linking requirements and use cases (many-to-many).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "requirement_use_cases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub requirement_id: i32,
    pub use_case_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "requirement::Entity",
        from = "Column::RequirementId",
        to = "requirement::Column::Id"
    )]
    Requirement,
    #[sea_orm(
        belongs_to = "use_case::Entity",
        from = "Column::UseCaseId",
        to = "use_case::Column::Id"
    )]
    UseCase,
}

impl ActiveModelBehavior for ActiveModel {}
