use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::source::{fetch_structure, StructureSource};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn StructureSource>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProteinQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProteinResponse {
    pub data: String,
}

const ALLOWED_HEADERS: [&str; 9] = [
    "x-csrf-token",
    "x-requested-with",
    "accept",
    "accept-version",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "x-api-version",
];

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(ALLOWED_HEADERS.map(HeaderName::from_static))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/protein", get(get_protein))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub async fn get_protein(
    State(state): State<AppState>,
    Query(query): Query<ProteinQuery>,
) -> Response {
    let raw_id = query.id.unwrap_or_default();
    match fetch_structure(state.source.as_ref(), &raw_id).await {
        Ok(data) => {
            info!(id = %raw_id.trim(), len = data.len(), "served protein");
            (StatusCode::OK, Json(ProteinResponse { data })).into_response()
        }
        Err(err) => {
            error!(id = %raw_id.trim(), "protein request failed: {err}");
            err.into_response()
        }
    }
}
