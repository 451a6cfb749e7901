use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode, header},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::NormalizePath;

use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::web::{
    extract::{FormBody, JsonBody},
    middleware::{auth, request_log},
    models::{LoginForm, TokenPair, TokenRefresh, UserRegisterIn},
    routes::*,
};

pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
}

async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<UserRegisterIn>,
) -> Result<(StatusCode, Json<TokenPair>), AppError> {
    let tokens =
        auth_service::register_user(&app_state.db_pool, payload, &app_state.config).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    FormBody(form): FormBody<LoginForm>,
) -> Result<Response, AppError> {
    let tokens = auth_service::login_user(&app_state.db_pool, form, &app_state.config).await?;

    let auth_cookie = Cookie::build((auth::TOKEN_COOKIE, tokens.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!app_state.config.api_debug)
        .build();
    let cookie_value = auth_cookie
        .to_string()
        .parse::<header::HeaderValue>()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let mut response = Json(tokens).into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, cookie_value);
    Ok(response)
}

async fn refresh_handler(
    State(app_state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<TokenRefresh>,
) -> Result<Json<TokenPair>, AppError> {
    let tokens = auth_service::refresh_tokens(
        &app_state.db_pool,
        &payload.refresh_token,
        &app_state.config,
    )
    .await?;
    Ok(Json(tokens))
}

/// Builds the application. `/api/monitors/` and `/api/monitors` reach the same
/// handler: trailing slashes are trimmed before routing.
pub fn create_axum_router(
    db_pool: DatabaseConnection,
    config: Arc<ServerConfig>,
) -> NormalizePath<Router> {
    let app_state = Arc::new(AppState { db_pool, config });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let router = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/refresh", post(refresh_handler))
        .nest(
            "/api/users",
            user_routes::create_public_router().merge(
                user_routes::create_protected_router()
                    .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
            ),
        )
        .nest(
            "/api/monitors",
            monitor_routes::create_monitor_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .nest("/checks", check_routes::create_check_router())
        .layer(cors)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            request_log::log_request,
        ))
        .with_state(app_state);

    NormalizePath::trim_trailing_slash(router)
}
