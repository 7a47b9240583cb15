//! Actor catalog. Actors are shared by every authenticated user and carry no
//! owner, so the handlers only require a valid identity.

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::schemas::{nullable, AppState, ListQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::actor;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, ModelTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateActorRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Free text, e.g. "Human" or "External System"
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100))]
    pub kind: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateActorRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100))]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActorResponse {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
}

impl From<actor::Model> for ActorResponse {
    fn from(model: actor::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            kind: model.kind,
            description: model.description,
        }
    }
}

async fn find_actor(state: &AppState, actor_id: i32) -> ApiResult<actor::Model> {
    actor::Entity::find_by_id(actor_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Actor"))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_actors(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Valid(Query(query)): Valid<Query<ListQuery>>,
) -> ApiResult<Json<Vec<ActorResponse>>> {
    trace!("Entering list_actors function");
    let actors = query
        .fetch(actor::Entity::find().order_by_asc(actor::Column::Id), &state.db)
        .await?;

    debug!("Retrieved {} actors", actors.len());
    Ok(Json(actors.into_iter().map(ActorResponse::from).collect()))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn create_actor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Valid(Json(request)): Valid<Json<CreateActorRequest>>,
) -> ApiResult<(StatusCode, Json<ActorResponse>)> {
    trace!("Entering create_actor function");
    let new_actor = actor::ActiveModel {
        name: Set(request.name),
        kind: Set(request.kind),
        description: Set(request.description),
        ..Default::default()
    };

    let created = new_actor.insert(&state.db).await?;
    info!("Actor created successfully: id={}", created.id);
    Ok((StatusCode::CREATED, Json(ActorResponse::from(created))))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_actor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(actor_id): Path<i32>,
) -> ApiResult<Json<ActorResponse>> {
    trace!("Entering get_actor function");
    Ok(Json(ActorResponse::from(find_actor(&state, actor_id).await?)))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn update_actor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(actor_id): Path<i32>,
    Valid(Json(request)): Valid<Json<UpdateActorRequest>>,
) -> ApiResult<Json<ActorResponse>> {
    trace!("Entering update_actor function");
    let mut actor = find_actor(&state, actor_id).await?.into_active_model();

    if let Some(name) = request.name {
        actor.name = Set(name);
    }
    if let Some(kind) = request.kind {
        actor.kind = Set(kind);
    }
    if let Some(description) = request.description {
        actor.description = Set(description);
    }

    let updated = actor.update(&state.db).await?;
    info!("Actor updated successfully: id={}", updated.id);
    Ok(Json(ActorResponse::from(updated)))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_actor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(actor_id): Path<i32>,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_actor function");
    find_actor(&state, actor_id).await?.delete(&state.db).await?;
    info!("Actor deleted successfully: id={}", actor_id);
    Ok(StatusCode::NO_CONTENT)
}
