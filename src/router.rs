use crate::handlers::{
    actors::{create_actor, delete_actor, get_actor, list_actors, update_actor},
    auth::{delete_me, login, me, register},
    health::health_check,
    projects::{create_project, delete_project, get_project, list_projects, update_project},
    relations::{create_relation, delete_relation, get_relation, list_relations},
    requirements::{
        create_requirement, delete_requirement, get_requirement, list_children,
        list_requirements, update_requirement,
    },
    scenarios::{create_scenario, delete_scenario, get_scenario, list_scenarios, update_scenario},
    use_cases::{create_use_case, delete_use_case, get_use_case, list_use_cases, update_use_case},
};
use crate::schemas::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let routes = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Identity
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me).delete(delete_me))
        // Projects
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:project_id",
            get(get_project).put(update_project).delete(delete_project),
        )
        // Requirements
        .route(
            "/projects/:project_id/requisitos",
            get(list_requirements).post(create_requirement),
        )
        .route(
            "/projects/:project_id/requisitos/:requirement_id",
            get(get_requirement)
                .put(update_requirement)
                .delete(delete_requirement),
        )
        .route(
            "/projects/:project_id/requisitos/:requirement_id/children",
            get(list_children),
        )
        // Use cases
        .route(
            "/projects/:project_id/casos_uso",
            get(list_use_cases).post(create_use_case),
        )
        .route(
            "/projects/:project_id/casos_uso/:use_case_id",
            get(get_use_case).put(update_use_case).delete(delete_use_case),
        )
        // Scenarios
        .route("/escenarios", get(list_scenarios).post(create_scenario))
        .route(
            "/escenarios/:scenario_id",
            get(get_scenario).put(update_scenario).delete(delete_scenario),
        )
        // Actor catalog
        .route("/actores", get(list_actors).post(create_actor))
        .route(
            "/actores/:actor_id",
            get(get_actor).put(update_actor).delete(delete_actor),
        )
        // Requirement <-> use case links
        .route("/relaciones", get(list_relations).post(create_relation))
        .route(
            "/relaciones/:relation_id",
            get(get_relation).delete(delete_relation),
        );

    with_middleware(routes).with_state(state)
}

/// Request tracing and response compression. Handlers run to completion;
/// only the database driver bounds how long a request may take.
fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new()),
    )
}
