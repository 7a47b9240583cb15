use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::schemas::{nullable, AppState, ListQuery, MAX_PAGE, MAX_PAGE_SIZE};
use crate::scope;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use model::entities::{
    project,
    scenario::{self, ScenarioKind},
    use_case,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, JoinType, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use validator::Validate;

/// Request body for creating a scenario
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateScenarioRequest {
    /// Use case the scenario walks through; must be reachable by the caller
    pub use_case_id: i32,
    /// Name of the scenario (e.g., "Wrong password")
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ScenarioKind,
    pub expected_result: Option<String>,
}

/// Request body for updating a scenario
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateScenarioRequest {
    /// Moves the scenario to another reachable use case
    pub use_case_id: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(rename = "type")]
    pub kind: Option<ScenarioKind>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<Option<String>>,
}

/// Scenario response model
#[derive(Debug, Serialize, Deserialize)]
pub struct ScenarioResponse {
    pub id: i32,
    pub use_case_id: i32,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ScenarioKind,
    pub expected_result: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<scenario::Model> for ScenarioResponse {
    fn from(model: scenario::Model) -> Self {
        Self {
            id: model.id,
            use_case_id: model.use_case_id,
            name: model.name,
            description: model.description,
            kind: model.kind,
            expected_result: model.expected_result,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Query parameters for listing scenarios
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct ListScenariosQuery {
    /// Only scenarios of this use case
    pub use_case_id: Option<i32>,
    /// Page number (starting from 0)
    #[validate(range(max = MAX_PAGE))]
    pub page: Option<u64>,
    /// Page size (default: 50 once paging is requested)
    #[validate(range(min = 1, max = MAX_PAGE_SIZE))]
    pub page_size: Option<u64>,
}

impl ListScenariosQuery {
    fn paging(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// List scenarios reachable by the caller
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_scenarios(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Valid(Query(query)): Valid<Query<ListScenariosQuery>>,
) -> ApiResult<Json<Vec<ScenarioResponse>>> {
    trace!("Entering list_scenarios function");
    let mut select = scenario::Entity::find()
        .join(JoinType::InnerJoin, scenario::Relation::UseCase.def())
        .join(JoinType::InnerJoin, use_case::Relation::Project.def())
        .filter(project::Column::OwnerId.eq(user.id));
    if let Some(use_case_id) = query.use_case_id {
        select = select.filter(scenario::Column::UseCaseId.eq(use_case_id));
    }

    let scenarios = query
        .paging()
        .fetch(select.order_by_asc(scenario::Column::Id), &state.db)
        .await?;

    debug!("Retrieved {} scenarios", scenarios.len());
    Ok(Json(scenarios.into_iter().map(ScenarioResponse::from).collect()))
}

/// Create a scenario under a reachable use case
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn create_scenario(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Valid(Json(request)): Valid<Json<CreateScenarioRequest>>,
) -> ApiResult<(StatusCode, Json<ScenarioResponse>)> {
    trace!("Entering create_scenario function");
    scope::reachable_use_case(&state.db, user.id, request.use_case_id).await?;

    let now = Utc::now().naive_utc();
    let new_scenario = scenario::ActiveModel {
        use_case_id: Set(request.use_case_id),
        name: Set(request.name),
        description: Set(request.description),
        kind: Set(request.kind),
        expected_result: Set(request.expected_result),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = new_scenario.insert(&state.db).await?;
    info!("Scenario created successfully: id={}", created.id);
    Ok((StatusCode::CREATED, Json(ScenarioResponse::from(created))))
}

/// Get a scenario by ID
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_scenario(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(scenario_id): Path<i32>,
) -> ApiResult<Json<ScenarioResponse>> {
    trace!("Entering get_scenario function");
    let scenario = scope::owned_scenario(&state.db, user.id, scenario_id).await?;
    Ok(Json(ScenarioResponse::from(scenario)))
}

/// Update a scenario
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn update_scenario(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(scenario_id): Path<i32>,
    Valid(Json(request)): Valid<Json<UpdateScenarioRequest>>,
) -> ApiResult<Json<ScenarioResponse>> {
    trace!("Entering update_scenario function");
    let existing = scope::owned_scenario(&state.db, user.id, scenario_id).await?;

    if let Some(use_case_id) = request.use_case_id {
        scope::reachable_use_case(&state.db, user.id, use_case_id).await?;
    }

    let mut scenario = existing.into_active_model();
    if let Some(use_case_id) = request.use_case_id {
        scenario.use_case_id = Set(use_case_id);
    }
    if let Some(name) = request.name {
        scenario.name = Set(name);
    }
    if let Some(description) = request.description {
        scenario.description = Set(description);
    }
    if let Some(kind) = request.kind {
        scenario.kind = Set(kind);
    }
    if let Some(expected_result) = request.expected_result {
        scenario.expected_result = Set(expected_result);
    }
    scenario.updated_at = Set(Utc::now().naive_utc());

    let updated = scenario.update(&state.db).await?;
    info!("Scenario updated successfully: id={}", updated.id);
    Ok(Json(ScenarioResponse::from(updated)))
}

/// Delete a scenario
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_scenario(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(scenario_id): Path<i32>,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_scenario function");
    let scenario = scope::owned_scenario(&state.db, user.id, scenario_id).await?;

    scenario.delete(&state.db).await?;
    info!("Scenario deleted successfully: id={}", scenario_id);
    Ok(StatusCode::NO_CONTENT)
}
