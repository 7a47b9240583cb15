//! Requirement to use case links. Like actors, relation rows are visible to
//! every authenticated user.

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::schemas::{AppState, ListQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::{requirement, requirement_use_case, use_case};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateRelationRequest {
    pub requirement_id: i32,
    pub use_case_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelationResponse {
    pub id: i32,
    pub requirement_id: i32,
    pub use_case_id: i32,
}

impl From<requirement_use_case::Model> for RelationResponse {
    fn from(model: requirement_use_case::Model) -> Self {
        Self {
            id: model.id,
            requirement_id: model.requirement_id,
            use_case_id: model.use_case_id,
        }
    }
}

async fn find_relation(state: &AppState, relation_id: i32) -> ApiResult<requirement_use_case::Model> {
    requirement_use_case::Entity::find_by_id(relation_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Relation"))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_relations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Valid(Query(query)): Valid<Query<ListQuery>>,
) -> ApiResult<Json<Vec<RelationResponse>>> {
    trace!("Entering list_relations function");
    let relations = query
        .fetch(
            requirement_use_case::Entity::find()
                .order_by_asc(requirement_use_case::Column::Id),
            &state.db,
        )
        .await?;

    debug!("Retrieved {} relations", relations.len());
    Ok(Json(relations.into_iter().map(RelationResponse::from).collect()))
}

/// Link a requirement to a use case
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn create_relation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateRelationRequest>,
) -> ApiResult<(StatusCode, Json<RelationResponse>)> {
    trace!("Entering create_relation function");

    requirement::Entity::find_by_id(request.requirement_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Requirement"))?;
    use_case::Entity::find_by_id(request.use_case_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Use case"))?;

    let duplicate = requirement_use_case::Entity::find()
        .filter(requirement_use_case::Column::RequirementId.eq(request.requirement_id))
        .filter(requirement_use_case::Column::UseCaseId.eq(request.use_case_id))
        .one(&state.db)
        .await?;
    if duplicate.is_some() {
        warn!(
            "Relation between requirement {} and use case {} already exists",
            request.requirement_id, request.use_case_id
        );
        return Err(ApiError::Conflict("Relation already exists".to_string()));
    }

    let new_relation = requirement_use_case::ActiveModel {
        requirement_id: Set(request.requirement_id),
        use_case_id: Set(request.use_case_id),
        ..Default::default()
    };
    let created = new_relation.insert(&state.db).await?;
    info!("Relation created successfully: id={}", created.id);
    Ok((StatusCode::CREATED, Json(RelationResponse::from(created))))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_relation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(relation_id): Path<i32>,
) -> ApiResult<Json<RelationResponse>> {
    trace!("Entering get_relation function");
    Ok(Json(RelationResponse::from(find_relation(&state, relation_id).await?)))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_relation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(relation_id): Path<i32>,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_relation function");
    find_relation(&state, relation_id).await?.delete(&state.db).await?;
    info!("Relation deleted successfully: id={}", relation_id);
    Ok(StatusCode::NO_CONTENT)
}
