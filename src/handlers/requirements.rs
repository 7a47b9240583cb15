use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::schemas::{nullable, AppState, ListQuery};
use crate::scope;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use model::cascade;
use model::entities::requirement::{self, RequirementKind, RequirementStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use validator::Validate;

/// Request body for creating a requirement
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateRequirementRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RequirementKind,
    /// Defaults to 1
    pub priority: Option<i32>,
    pub source: Option<String>,
    pub notes: Option<String>,
    /// Defaults to `Proposed`
    pub status: Option<RequirementStatus>,
    /// Defaults to 1
    pub version: Option<i32>,
    /// Requirement of the same project this one refines
    pub parent_id: Option<i32>,
}

/// Request body for updating a requirement. Absent fields are left untouched;
/// `"parent_id": null` detaches the requirement from its parent. `null` on
/// `source` or `notes` clears that field.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateRequirementRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<RequirementKind>,
    pub priority: Option<i32>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub source: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    pub status: Option<RequirementStatus>,
    pub version: Option<i32>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<i32>>,
}

/// Requirement response model
#[derive(Debug, Serialize, Deserialize)]
pub struct RequirementResponse {
    pub id: i32,
    pub project_id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RequirementKind,
    pub priority: i32,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub status: RequirementStatus,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<requirement::Model> for RequirementResponse {
    fn from(model: requirement::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            parent_id: model.parent_id,
            name: model.name,
            description: model.description,
            kind: model.kind,
            priority: model.priority,
            source: model.source,
            notes: model.notes,
            status: model.status,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List requirements of an owned project
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_requirements(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i32>,
    Valid(Query(query)): Valid<Query<ListQuery>>,
) -> ApiResult<Json<Vec<RequirementResponse>>> {
    trace!("Entering list_requirements function");
    scope::owned_project(&state.db, user.id, project_id).await?;

    let requirements = query
        .fetch(
            requirement::Entity::find()
                .filter(requirement::Column::ProjectId.eq(project_id))
                .order_by_asc(requirement::Column::Id),
            &state.db,
        )
        .await?;

    debug!("Retrieved {} requirements for project {}", requirements.len(), project_id);
    Ok(Json(requirements.into_iter().map(RequirementResponse::from).collect()))
}

/// Create a requirement under an owned project
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn create_requirement(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i32>,
    Valid(Json(request)): Valid<Json<CreateRequirementRequest>>,
) -> ApiResult<(StatusCode, Json<RequirementResponse>)> {
    trace!("Entering create_requirement function");
    scope::owned_project(&state.db, user.id, project_id).await?;

    if let Some(parent_id) = request.parent_id {
        scope::project_requirement(&state.db, project_id, parent_id)
            .await
            .map_err(|_| ApiError::not_found("Parent requirement"))?;
    }

    let now = Utc::now().naive_utc();
    let new_requirement = requirement::ActiveModel {
        project_id: Set(project_id),
        parent_id: Set(request.parent_id),
        name: Set(request.name),
        description: Set(request.description),
        kind: Set(request.kind),
        priority: Set(request.priority.unwrap_or(1)),
        source: Set(request.source),
        notes: Set(request.notes),
        status: Set(request.status.unwrap_or_default()),
        version: Set(request.version.unwrap_or(1)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = new_requirement.insert(&state.db).await?;
    info!("Requirement created successfully: id={}, project={}", created.id, project_id);
    Ok((StatusCode::CREATED, Json(RequirementResponse::from(created))))
}

/// Get a requirement of an owned project
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_requirement(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((project_id, requirement_id)): Path<(i32, i32)>,
) -> ApiResult<Json<RequirementResponse>> {
    trace!("Entering get_requirement function");
    let requirement =
        scope::owned_requirement(&state.db, user.id, project_id, requirement_id).await?;
    Ok(Json(RequirementResponse::from(requirement)))
}

/// List the direct dependents of a requirement
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_children(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((project_id, requirement_id)): Path<(i32, i32)>,
) -> ApiResult<Json<Vec<RequirementResponse>>> {
    trace!("Entering list_children function");
    let requirement =
        scope::owned_requirement(&state.db, user.id, project_id, requirement_id).await?;

    let children = requirement.get_children(&state.db).await?;
    debug!("Requirement {} has {} children", requirement_id, children.len());
    Ok(Json(children.into_iter().map(RequirementResponse::from).collect()))
}

/// Update a requirement of an owned project
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn update_requirement(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((project_id, requirement_id)): Path<(i32, i32)>,
    Valid(Json(request)): Valid<Json<UpdateRequirementRequest>>,
) -> ApiResult<Json<RequirementResponse>> {
    trace!("Entering update_requirement function");
    let existing =
        scope::owned_requirement(&state.db, user.id, project_id, requirement_id).await?;

    if let Some(Some(parent_id)) = request.parent_id {
        let parent = scope::project_requirement(&state.db, project_id, parent_id)
            .await
            .map_err(|_| ApiError::not_found("Parent requirement"))?;
        if parent.has_ancestor(&state.db, requirement_id).await? {
            warn!("Rejected parent {} for requirement {}: cycle", parent_id, requirement_id);
            return Err(ApiError::BadRequest(
                "Requirement cannot be its own ancestor".to_string(),
            ));
        }
    }

    let mut requirement = existing.into_active_model();
    if let Some(name) = request.name {
        requirement.name = Set(name);
    }
    if let Some(description) = request.description {
        requirement.description = Set(description);
    }
    if let Some(kind) = request.kind {
        requirement.kind = Set(kind);
    }
    if let Some(priority) = request.priority {
        requirement.priority = Set(priority);
    }
    if let Some(source) = request.source {
        requirement.source = Set(source);
    }
    if let Some(notes) = request.notes {
        requirement.notes = Set(notes);
    }
    if let Some(status) = request.status {
        requirement.status = Set(status);
    }
    // Last write wins; the version number is informational.
    if let Some(version) = request.version {
        requirement.version = Set(version);
    }
    if let Some(parent_id) = request.parent_id {
        requirement.parent_id = Set(parent_id);
    }
    requirement.updated_at = Set(Utc::now().naive_utc());

    let updated = requirement.update(&state.db).await?;
    info!("Requirement updated successfully: id={}", updated.id);
    Ok(Json(RequirementResponse::from(updated)))
}

/// Delete a requirement, its dependents and their use cases
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_requirement(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((project_id, requirement_id)): Path<(i32, i32)>,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_requirement function");
    let requirement =
        scope::owned_requirement(&state.db, user.id, project_id, requirement_id).await?;

    let report = cascade::delete_requirement(&state.db, &requirement).await?;
    info!(
        "Requirement deleted: id={}, requirements={}, use_cases={}",
        requirement_id, report.requirements, report.use_cases
    );
    Ok(StatusCode::NO_CONTENT)
}
