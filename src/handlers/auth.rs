use crate::auth::{password, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::schemas::AppState;
use axum::{extract::State, http::StatusCode, response::Json, Form};
use axum_valid::Valid;
use model::cascade;
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use validator::Validate;

/// Request body for registering a new account
#[derive(Deserialize, Serialize, Validate)]
pub struct RegisterRequest {
    /// Username (must be unique)
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    /// Email address (must be unique)
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Keeps the password out of the request span.
impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// OAuth2 password-flow login form
#[derive(Deserialize, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued access token
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Public profile of an account
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
        }
    }
}

/// Register a new account
#[instrument(skip(state))]
pub async fn register(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<RegisterRequest>>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    trace!("Entering register function");

    let taken = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(request.username.as_str()))
                .add(user::Column::Email.eq(request.email.as_str())),
        )
        .one(&state.db)
        .await?;
    if let Some(existing) = taken {
        let field = if existing.username == request.username { "Username" } else { "Email" };
        warn!("{} already registered for '{}'", field, request.username);
        return Err(ApiError::Conflict(format!("{} already registered", field)));
    }

    let password_hash = password::hash_password(&request.password)?;
    let new_user = user::ActiveModel {
        username: Set(request.username),
        email: Set(request.email),
        password_hash: Set(password_hash),
        ..Default::default()
    };

    trace!("Attempting to insert new user into database");
    let user_model = new_user.insert(&state.db).await?;
    info!("User registered with ID: {}, username: {}", user_model.id, user_model.username);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user_model))))
}

/// Exchange username and password for an access token
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<TokenResponse>> {
    trace!("Entering login function");

    let found = user::Entity::find()
        .filter(user::Column::Username.eq(form.username.as_str()))
        .one(&state.db)
        .await?;

    let user_model = match found {
        Some(user_model) if password::verify_password(&form.password, &user_model.password_hash) => {
            user_model
        }
        _ => {
            warn!("Failed login attempt");
            return Err(ApiError::Unauthorized(
                "Incorrect username or password".to_string(),
            ));
        }
    };

    let access_token = state.tokens.issue(&user_model.username)?;
    info!("Issued access token for user ID: {}", user_model.id);
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Profile of the authenticated caller
#[instrument(skip(user), fields(user_id = user.id))]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    debug!("Returning profile");
    Json(UserResponse::from(user))
}

/// Delete the authenticated caller together with everything they own
#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_me function");
    let report = cascade::delete_user(&state.db, user.id).await?;
    info!(
        "Deleted account '{}' with {} project(s)",
        user.username, report.projects
    );
    Ok(StatusCode::NO_CONTENT)
}
