//! Records every inbound request: a `tracing` event plus a `request_logs` row.

use axum::{
    body::Body as AxumBody,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::db::services::request_log_service;
use crate::web::AppState;

pub async fn log_request(
    State(state): State<Arc<AppState>>,
    req: Request<AxumBody>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let response = next.run(req).await;

    let latency_ms = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);
    let status = response.status().as_u16();
    info!(
        method = %method,
        path = %path,
        status,
        latency_ms,
        ip = ip.as_deref().unwrap_or("-"),
        "Handled request."
    );

    if let Err(e) =
        request_log_service::record_request(&state.db_pool, &method, &path, status, latency_ms, ip)
            .await
    {
        error!(error = %e, path = %path, "Failed to persist request log.");
    }

    response
}
