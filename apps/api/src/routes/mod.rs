pub mod health;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::applications::handlers;
use crate::importer::handlers::handle_import;
use crate::state::AppState;

/// Success envelope: every payload goes out under `data`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn json(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/applications",
            get(handlers::handle_list).post(handlers::handle_create),
        )
        .route("/applications/import", post(handle_import))
        .route(
            "/applications/:id",
            get(handlers::handle_get)
                .put(handlers::handle_update)
                .delete(handlers::handle_delete),
        )
        .route("/applications/:id/detail", get(handlers::handle_get_detail))
        .with_state(state)
}
