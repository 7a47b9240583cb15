use crate::auth::CurrentUser;
use crate::error::ApiResult;
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
use model::entities::use_case::{self, UseCaseCategory, UseCaseStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use validator::Validate;

/// Request body for creating a use case
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateUseCaseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    /// Comma separated actor names
    pub actors: Option<String>,
    pub preconditions: Option<String>,
    pub postconditions: Option<String>,
    pub normal_flow: Option<String>,
    pub alternate_flow: Option<String>,
    pub category: UseCaseCategory,
    /// Defaults to `Proposed`
    pub status: Option<UseCaseStatus>,
    /// Requirement of the same project this use case realizes
    pub requirement_id: Option<i32>,
}

/// Request body for updating a use case. Absent fields are left untouched;
/// `"requirement_id": null` unlinks the requirement. `null` on any of the
/// optional text fields clears it.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateUseCaseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub actors: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub postconditions: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub normal_flow: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub alternate_flow: Option<Option<String>>,
    pub category: Option<UseCaseCategory>,
    pub status: Option<UseCaseStatus>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<Option<i32>>,
}

/// Use case response model
#[derive(Debug, Serialize, Deserialize)]
pub struct UseCaseResponse {
    pub id: i32,
    pub project_id: i32,
    pub requirement_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub actors: Option<String>,
    pub preconditions: Option<String>,
    pub postconditions: Option<String>,
    pub normal_flow: Option<String>,
    pub alternate_flow: Option<String>,
    pub category: UseCaseCategory,
    pub status: UseCaseStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<use_case::Model> for UseCaseResponse {
    fn from(model: use_case::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            requirement_id: model.requirement_id,
            title: model.title,
            description: model.description,
            actors: model.actors,
            preconditions: model.preconditions,
            postconditions: model.postconditions,
            normal_flow: model.normal_flow,
            alternate_flow: model.alternate_flow,
            category: model.category,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List use cases of an owned project
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_use_cases(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i32>,
    Valid(Query(query)): Valid<Query<ListQuery>>,
) -> ApiResult<Json<Vec<UseCaseResponse>>> {
    trace!("Entering list_use_cases function");
    scope::owned_project(&state.db, user.id, project_id).await?;

    let use_cases = query
        .fetch(
            use_case::Entity::find()
                .filter(use_case::Column::ProjectId.eq(project_id))
                .order_by_asc(use_case::Column::Id),
            &state.db,
        )
        .await?;

    debug!("Retrieved {} use cases for project {}", use_cases.len(), project_id);
    Ok(Json(use_cases.into_iter().map(UseCaseResponse::from).collect()))
}

/// Create a use case under an owned project
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn create_use_case(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i32>,
    Valid(Json(request)): Valid<Json<CreateUseCaseRequest>>,
) -> ApiResult<(StatusCode, Json<UseCaseResponse>)> {
    trace!("Entering create_use_case function");
    scope::owned_project(&state.db, user.id, project_id).await?;

    if let Some(requirement_id) = request.requirement_id {
        scope::project_requirement(&state.db, project_id, requirement_id).await?;
    }

    let now = Utc::now().naive_utc();
    let new_use_case = use_case::ActiveModel {
        project_id: Set(project_id),
        requirement_id: Set(request.requirement_id),
        title: Set(request.title),
        description: Set(request.description),
        actors: Set(request.actors),
        preconditions: Set(request.preconditions),
        postconditions: Set(request.postconditions),
        normal_flow: Set(request.normal_flow),
        alternate_flow: Set(request.alternate_flow),
        category: Set(request.category),
        status: Set(request.status.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = new_use_case.insert(&state.db).await?;
    info!("Use case created successfully: id={}, project={}", created.id, project_id);
    Ok((StatusCode::CREATED, Json(UseCaseResponse::from(created))))
}

/// Get a use case of an owned project
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_use_case(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((project_id, use_case_id)): Path<(i32, i32)>,
) -> ApiResult<Json<UseCaseResponse>> {
    trace!("Entering get_use_case function");
    let use_case = scope::owned_use_case(&state.db, user.id, project_id, use_case_id).await?;
    Ok(Json(UseCaseResponse::from(use_case)))
}

/// Update a use case of an owned project
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn update_use_case(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((project_id, use_case_id)): Path<(i32, i32)>,
    Valid(Json(request)): Valid<Json<UpdateUseCaseRequest>>,
) -> ApiResult<Json<UseCaseResponse>> {
    trace!("Entering update_use_case function");
    let existing = scope::owned_use_case(&state.db, user.id, project_id, use_case_id).await?;

    if let Some(Some(requirement_id)) = request.requirement_id {
        scope::project_requirement(&state.db, project_id, requirement_id).await?;
    }

    let mut use_case = existing.into_active_model();
    if let Some(title) = request.title {
        use_case.title = Set(title);
    }
    if let Some(description) = request.description {
        use_case.description = Set(description);
    }
    if let Some(actors) = request.actors {
        use_case.actors = Set(actors);
    }
    if let Some(preconditions) = request.preconditions {
        use_case.preconditions = Set(preconditions);
    }
    if let Some(postconditions) = request.postconditions {
        use_case.postconditions = Set(postconditions);
    }
    if let Some(normal_flow) = request.normal_flow {
        use_case.normal_flow = Set(normal_flow);
    }
    if let Some(alternate_flow) = request.alternate_flow {
        use_case.alternate_flow = Set(alternate_flow);
    }
    if let Some(category) = request.category {
        use_case.category = Set(category);
    }
    if let Some(status) = request.status {
        use_case.status = Set(status);
    }
    if let Some(requirement_id) = request.requirement_id {
        use_case.requirement_id = Set(requirement_id);
    }
    use_case.updated_at = Set(Utc::now().naive_utc());

    let updated = use_case.update(&state.db).await?;
    info!("Use case updated successfully: id={}", updated.id);
    Ok(Json(UseCaseResponse::from(updated)))
}

/// Delete a use case with its scenarios
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_use_case(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((project_id, use_case_id)): Path<(i32, i32)>,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_use_case function");
    scope::owned_use_case(&state.db, user.id, project_id, use_case_id).await?;

    let report = cascade::delete_use_case(&state.db, use_case_id).await?;
    info!("Use case deleted: id={}, scenarios={}", use_case_id, report.scenarios);
    Ok(StatusCode::NO_CONTENT)
}
