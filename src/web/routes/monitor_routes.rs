use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;
use tracing::info;

use crate::db::services::{check_service, monitor_service};
use crate::web::models::CurrentUser;
use crate::web::models::check_models::{CheckListQuery, CheckOut};
use crate::web::models::monitor_models::{
    MonitorCreate, MonitorListQuery, MonitorOut, MonitorUpdate,
};
use crate::web::extract::{JsonBody, PathParams, QueryParams};
use crate::web::{AppError, AppState};

const DUPLICATE_MONITOR: &str = "Monitor with this url already exists";

pub fn create_monitor_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_monitors).post(create_monitor))
        .route(
            "/{id}",
            get(get_monitor).patch(update_monitor).delete(delete_monitor),
        )
        .route("/{id}/checks", get(list_monitor_checks))
}

#[axum::debug_handler]
async fn create_monitor(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    JsonBody(mut payload): JsonBody<MonitorCreate>,
) -> Result<(StatusCode, Json<MonitorOut>), AppError> {
    payload.validate()?;

    if monitor_service::exists_url_for_user(&app_state.db_pool, user.id, &payload.url).await? {
        return Err(AppError::Conflict(DUPLICATE_MONITOR.to_string()));
    }

    // The unique indexes still catch a concurrent insert or a duplicate name.
    let created = monitor_service::create_monitor(&app_state.db_pool, user.id, payload)
        .await
        .map_err(|e| AppError::conflict_or_db(e, DUPLICATE_MONITOR))?;

    info!(monitor_id = created.id, user_id = user.id, "Monitor created.");
    Ok((StatusCode::CREATED, Json(MonitorOut::from(created))))
}

#[axum::debug_handler]
async fn list_monitors(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<MonitorListQuery>,
) -> Result<Json<Vec<MonitorOut>>, AppError> {
    let monitors =
        monitor_service::list_for_user(&app_state.db_pool, user.id, query.limit, query.offset)
            .await?;
    Ok(Json(monitors.into_iter().map(MonitorOut::from).collect()))
}

#[axum::debug_handler]
async fn get_monitor(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    PathParams(id): PathParams<i32>,
) -> Result<Json<MonitorOut>, AppError> {
    let monitor = monitor_service::get_for_user(&app_state.db_pool, user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Monitor not found".to_string()))?;
    Ok(Json(MonitorOut::from(monitor)))
}

#[axum::debug_handler]
async fn update_monitor(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    PathParams(id): PathParams<i32>,
    JsonBody(mut payload): JsonBody<MonitorUpdate>,
) -> Result<Json<MonitorOut>, AppError> {
    payload.validate()?;

    let updated = monitor_service::update_for_user(&app_state.db_pool, user.id, id, payload)
        .await
        .map_err(|e| AppError::conflict_or_db(e, DUPLICATE_MONITOR))?
        .ok_or_else(|| AppError::NotFound("Monitor not found".to_string()))?;

    Ok(Json(MonitorOut::from(updated)))
}

#[axum::debug_handler]
async fn delete_monitor(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    PathParams(id): PathParams<i32>,
) -> Result<StatusCode, AppError> {
    if !monitor_service::delete_for_user(&app_state.db_pool, user.id, id).await? {
        return Err(AppError::NotFound("Monitor not found".to_string()));
    }
    info!(monitor_id = id, user_id = user.id, "Monitor deleted.");
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
async fn list_monitor_checks(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    PathParams(id): PathParams<i32>,
    QueryParams(query): QueryParams<CheckListQuery>,
) -> Result<Json<Vec<CheckOut>>, AppError> {
    monitor_service::get_for_user(&app_state.db_pool, user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Monitor not found".to_string()))?;

    let checks =
        check_service::list_for_monitor(&app_state.db_pool, id, query.limit, query.offset).await?;
    Ok(Json(checks.into_iter().map(CheckOut::from).collect()))
}
