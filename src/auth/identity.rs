use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use model::entities::user;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{debug, trace};

use crate::error::ApiError;
use crate::schemas::AppState;

/// The authenticated caller, resolved from the `Authorization: Bearer` header.
///
/// Taking this extractor as a handler argument is what makes a route
/// protected: resolution failures short-circuit with 401 before the handler
/// body runs.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        resolve_identity(state, token).await.map(CurrentUser)
    }
}

/// Pull the raw token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?
        .to_str()
        .map_err(|_| invalid_credentials())?;

    let (scheme, token) = value.split_once(' ').ok_or_else(invalid_credentials)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(invalid_credentials());
    }
    Ok(token.trim())
}

/// Verify a token and load the user named by its subject.
pub async fn resolve_identity(state: &AppState, token: &str) -> Result<user::Model, ApiError> {
    let claims = state.tokens.verify(token).map_err(|e| {
        debug!("Rejected access token: {}", e);
        invalid_credentials()
    })?;

    trace!("Token subject: {}", claims.sub);
    user::Entity::find()
        .filter(user::Column::Username.eq(claims.sub.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Could not validate credentials".to_string())
}
