use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;
use tracing::info;

use crate::db::services::user_service;
use crate::services::auth_service;
use crate::web::models::user_models::{UserOut, UserUpdateIn};
use crate::web::models::{CurrentUser, UserRegisterIn};
use crate::web::extract::{JsonBody, PathParams};
use crate::web::{AppError, AppState};

/// Routes reachable without a token.
pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(create_user))
}

pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/me",
            get(auth_service::me)
                .patch(update_own_profile)
                .delete(delete_own_profile),
        )
        .route("/{user_id}", get(get_user_by_id))
}

async fn create_user(
    State(app_state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<UserRegisterIn>,
) -> Result<(StatusCode, Json<UserOut>), AppError> {
    let user = auth_service::create_user(&app_state.db_pool, payload, &app_state.config).await?;
    Ok((StatusCode::CREATED, Json(UserOut::from(user))))
}

async fn get_user_by_id(
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    PathParams(user_id): PathParams<i32>,
) -> Result<Json<UserOut>, AppError> {
    // There is no admin role, so a user may only read their own profile.
    if user_id != current.id {
        return Err(AppError::Forbidden(
            "You can only view your own profile".to_string(),
        ));
    }

    let user = user_service::get_user_by_id(&app_state.db_pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(UserOut::from(user)))
}

async fn update_own_profile(
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    JsonBody(mut payload): JsonBody<UserUpdateIn>,
) -> Result<Json<UserOut>, AppError> {
    if payload.is_empty() {
        return Ok(Json(UserOut::from(current)));
    }
    payload.validate()?;

    let updated = user_service::update_user(&app_state.db_pool, current.id, payload)
        .await
        .map_err(|e| {
            AppError::conflict_or_db(e, "User with this tg_id or email already exists")
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserOut::from(updated)))
}

async fn delete_own_profile(
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    if !user_service::delete_user(&app_state.db_pool, current.id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    info!(user_id = current.id, "User deleted their profile.");
    Ok(StatusCode::NO_CONTENT)
}
