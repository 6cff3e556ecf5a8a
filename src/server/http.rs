//! HTTP routes for viewers
//!
//! - `GET /streams`: JSON listing of configured streams
//! - `GET /streams/{id}`: live `multipart/x-mixed-replace` stream

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use futures_util::StreamExt;
use tower_http::cors::CorsLayer;

use crate::distributor::{Distributor, MultipartEncoder};
use crate::registry::StreamId;

/// Shared state for the HTTP routes
struct HttpState {
    distributor: Distributor,
    encoder: MultipartEncoder,
}

/// Build the viewer-facing router
pub fn router(distributor: Distributor, encoder: MultipartEncoder) -> Router {
    let state = Arc::new(HttpState {
        distributor,
        encoder,
    });

    Router::new()
        .route("/streams", get(list_streams))
        .route("/streams/:id", get(stream_by_id))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /streams
async fn list_streams(State(state): State<Arc<HttpState>>) -> Json<serde_json::Value> {
    let streams = state.distributor.registry().stream_info().await;
    Json(serde_json::json!({ "streams": streams }))
}

/// GET /streams/{id}
async fn stream_by_id(State(state): State<Arc<HttpState>>, Path(id): Path<u32>) -> Response {
    let id = StreamId(id);

    let subscription = match state.distributor.subscribe(id) {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::debug!(stream = %id, "Viewer requested unknown stream");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };

    let encoder = state.encoder.clone();
    let parts = subscription
        .into_stream()
        .map(move |frame| Ok::<_, Infallible>(encoder.encode(&frame)));

    (
        [
            (header::CONTENT_TYPE, state.encoder.response_content_type()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        Body::from_stream(parts),
    )
        .into_response()
}
