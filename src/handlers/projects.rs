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
use model::entities::project::{self, ProjectStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use validator::Validate;

/// Request body for creating a project
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name (unique across all users)
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `Active`
    pub status: Option<ProjectStatus>,
}

/// Request body for updating a project. Absent fields are left untouched;
/// `"description": null` clears the description.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
}

/// Project response model
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub owner_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<project::Model> for ProjectResponse {
    fn from(model: project::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            status: model.status,
            owner_id: model.owner_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fails with 400 when another project already uses `name`.
async fn ensure_name_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    except_id: Option<i32>,
) -> ApiResult<()> {
    let mut query = project::Entity::find().filter(project::Column::Name.eq(name));
    if let Some(id) = except_id {
        query = query.filter(project::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        warn!("Project name '{}' already exists", name);
        return Err(ApiError::Conflict("Project name already exists".to_string()));
    }
    Ok(())
}

/// List the caller's projects
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Valid(Query(query)): Valid<Query<ListQuery>>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    trace!("Entering list_projects function");

    let projects = query
        .fetch(
            project::Entity::find()
                .filter(project::Column::OwnerId.eq(user.id))
                .order_by_asc(project::Column::Id),
            &state.db,
        )
        .await?;

    debug!("Retrieved {} projects", projects.len());
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

/// Create a project owned by the caller
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Valid(Json(request)): Valid<Json<CreateProjectRequest>>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    trace!("Entering create_project function");
    ensure_name_free(&state.db, &request.name, None).await?;

    let now = Utc::now().naive_utc();
    let new_project = project::ActiveModel {
        name: Set(request.name),
        description: Set(request.description),
        status: Set(request.status.unwrap_or_default()),
        owner_id: Set(user.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = new_project.insert(&state.db).await?;
    info!("Project created successfully: id={}", created.id);
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(created))))
}

/// Get one of the caller's projects
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i32>,
) -> ApiResult<Json<ProjectResponse>> {
    trace!("Entering get_project function");
    let project = scope::owned_project(&state.db, user.id, project_id).await?;
    Ok(Json(ProjectResponse::from(project)))
}

/// Update one of the caller's projects
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i32>,
    Valid(Json(request)): Valid<Json<UpdateProjectRequest>>,
) -> ApiResult<Json<ProjectResponse>> {
    trace!("Entering update_project function");
    let existing = scope::owned_project(&state.db, user.id, project_id).await?;

    if let Some(name) = &request.name {
        if *name != existing.name {
            ensure_name_free(&state.db, name, Some(project_id)).await?;
        }
    }

    let mut project = existing.into_active_model();
    if let Some(name) = request.name {
        project.name = Set(name);
    }
    if let Some(description) = request.description {
        project.description = Set(description);
    }
    if let Some(status) = request.status {
        project.status = Set(status);
    }
    project.updated_at = Set(Utc::now().naive_utc());

    let updated = project.update(&state.db).await?;
    info!("Project updated successfully: id={}", updated.id);
    Ok(Json(ProjectResponse::from(updated)))
}

/// Delete one of the caller's projects and everything under it
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i32>,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_project function");
    scope::owned_project(&state.db, user.id, project_id).await?;

    let report = cascade::delete_project(&state.db, project_id).await?;
    info!(
        "Project deleted: id={}, requirements={}, use_cases={}, scenarios={}",
        project_id, report.requirements, report.use_cases, report.scenarios
    );
    Ok(StatusCode::NO_CONTENT)
}
