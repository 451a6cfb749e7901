use axum::{Json, Router, routing::post};
use std::sync::Arc;

use crate::web::AppState;
use crate::web::models::check_models::CHECK_STUB_MESSAGE;

pub fn create_check_router() -> Router<Arc<AppState>> {
    Router::new().route("/stub", post(check_stub))
}

async fn check_stub() -> Json<&'static str> {
    Json(CHECK_STUB_MESSAGE)
}
