use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::constants::ERR_INVALID_EMAIL;
use crate::db::{resolve, USERS};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveUserParams {
    #[serde(rename = "userEmail", default)]
    pub user_email: String,
}

/// Look up a user by id or display name
///
/// GET /api/user/:user
pub async fn get_user(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<User>> {
    tracing::debug!("Retrieving user with reference: {}", user.trim());

    let id = resolve(&state.store, &user, &USERS).await?;
    let user = state.store.find_user(id).await?;
    Ok(Json(user))
}

/// Fetch a user by e-mail, creating it on first use
///
/// POST /api/user?userEmail=<email>
pub async fn save_user(
    State(state): State<AppState>,
    Query(params): Query<SaveUserParams>,
) -> Result<Json<User>> {
    let email = params.user_email.trim();
    if !User::validate_email(email) {
        return Err(AppError::InvalidInput(ERR_INVALID_EMAIL.to_string()));
    }

    let user = state.store.get_or_create_user(email).await?;
    tracing::info!("Resolved user {} by e-mail", user.id);
    Ok(Json(user))
}

/// Every user, ordered by id
///
/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}
