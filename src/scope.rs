//! Ownership-scoped lookups.
//!
//! Every function here returns `ApiError::NotFound` both for rows that do not
//! exist and for rows outside the caller's ownership chain.

use model::entities::{project, requirement, scenario, use_case};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
};
use tracing::trace;

use crate::error::{ApiError, ApiResult};

/// Project `project_id`, if owned by `owner_id`.
pub async fn owned_project<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    project_id: i32,
) -> ApiResult<project::Model> {
    trace!("Resolving project {} for owner {}", project_id, owner_id);
    project::Entity::find_by_id(project_id)
        .filter(project::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))
}

/// Requirement `requirement_id` of an owned project.
///
/// The requirement must belong to `project_id`; one living under another
/// project, even an owned one, is not found.
pub async fn owned_requirement<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    project_id: i32,
    requirement_id: i32,
) -> ApiResult<requirement::Model> {
    owned_project(db, owner_id, project_id).await?;
    project_requirement(db, project_id, requirement_id).await
}

/// Requirement `requirement_id` of a project whose ownership is already verified.
pub async fn project_requirement<C: ConnectionTrait>(
    db: &C,
    project_id: i32,
    requirement_id: i32,
) -> ApiResult<requirement::Model> {
    requirement::Entity::find_by_id(requirement_id)
        .filter(requirement::Column::ProjectId.eq(project_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Requirement"))
}

/// Use case `use_case_id` of an owned project.
pub async fn owned_use_case<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    project_id: i32,
    use_case_id: i32,
) -> ApiResult<use_case::Model> {
    owned_project(db, owner_id, project_id).await?;
    use_case::Entity::find_by_id(use_case_id)
        .filter(use_case::Column::ProjectId.eq(project_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Use case"))
}

/// Use case `use_case_id` of any project owned by `owner_id`.
pub async fn reachable_use_case<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    use_case_id: i32,
) -> ApiResult<use_case::Model> {
    use_case::Entity::find_by_id(use_case_id)
        .inner_join(project::Entity)
        .filter(project::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Use case"))
}

/// Scenario `scenario_id`, reachable through use case and project.
pub async fn owned_scenario<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    scenario_id: i32,
) -> ApiResult<scenario::Model> {
    scenario::Entity::find_by_id(scenario_id)
        .inner_join(use_case::Entity)
        .join(JoinType::InnerJoin, use_case::Relation::Project.def())
        .filter(project::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Scenario"))
}
