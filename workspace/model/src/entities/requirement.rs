use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RequirementKind {
    #[sea_orm(string_value = "Functional")]
    Functional,
    #[serde(rename = "Non-Functional")]
    #[sea_orm(string_value = "Non-Functional")]
    NonFunctional,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RequirementStatus {
    #[default]
    #[sea_orm(string_value = "Proposed")]
    Proposed,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Implemented")]
    Implemented,
    #[sea_orm(string_value = "Verified")]
    Verified,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

/// A requirement of a project.
///
/// Requirements form a refinement tree inside their project: `parent_id`
/// points at the requirement this one refines. Deleting a requirement
/// removes its whole subtree (see [`crate::cascade`]).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "requirements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: i32,
    /// Self-referencing foreign key for the refinement tree.
    pub parent_id: Option<i32>,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub kind: RequirementKind,
    pub priority: i32,
    pub source: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub status: RequirementStatus,
    /// Caller-maintained revision number. Not a concurrency token.
    pub version: i32,
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
    /// Defines the self-referencing relationship for the parent requirement.
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    #[sea_orm(has_many = "super::use_case::Entity")]
    UseCase,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parent.def()
    }

    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::use_case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UseCase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Gets all direct dependents of this requirement.
    pub async fn get_children<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ParentId.eq(self.id))
            .all(db)
            .await
    }

    /// Walks up the parent chain and reports whether `candidate` is this
    /// requirement or one of its ancestors.
    ///
    /// The walk is bounded by the number of visited rows so that corrupt
    /// cyclic data cannot loop forever.
    pub async fn has_ancestor<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate: i32,
    ) -> Result<bool, DbErr> {
        let mut seen = std::collections::HashSet::new();
        let mut current = Some(self.id);
        let mut next_parent = self.parent_id;

        while let Some(id) = current {
            if id == candidate {
                return Ok(true);
            }
            if !seen.insert(id) {
                break;
            }
            current = next_parent;
            next_parent = match current {
                Some(parent_id) => Entity::find_by_id(parent_id)
                    .one(db)
                    .await?
                    .and_then(|parent| parent.parent_id),
                None => None,
            };
        }

        Ok(false)
    }
}
