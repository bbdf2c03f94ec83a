use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{CreateEventRequest, EventPatch};
use crate::AppState;

const EVENT_NOT_FOUND: &str = "Event not found";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route(
            "/events/{id}/image",
            get(get_event_image).put(upload_event_image),
        )
}

/* ---------- helpers ---------- */

/// An id that is not a uuid cannot name a stored event.
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::not_found(not_found, format!("no record with id '{}'", raw)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListLimit {
    value: usize,
    /// The caller asked for more than `MAX_LIST_LIMIT`.
    clamped: bool,
}

/// Missing, unparsable or non-positive limits fall back to the default;
/// everything else is clamped to the configured maximum.
fn resolve_limit(raw: Option<&str>, api: &ApiConfig) -> ListLimit {
    match raw.and_then(|l| l.parse::<usize>().ok()) {
        Some(limit) if limit > 0 => ListLimit {
            value: limit.min(api.max_list_limit),
            clamped: limit > api.max_list_limit,
        },
        _ => ListLimit {
            value: api.default_list_limit,
            clamped: false,
        },
    }
}

fn image_key(id: Uuid) -> String {
    format!("events/{}", id)
}

/* ---------- EVENTS ---------- */

// GET /api/events?category_id=&limit=
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub category_id: Option<String>,
    pub limit: Option<String>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = resolve_limit(params.limit.as_deref(), &state.config.api);
    if limit.clamped {
        debug!(max = limit.value, "Requested limit clamped");
    }

    let category_id = match params.category_id.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(Uuid::parse_str(raw).map_err(|e| {
            ApiError::bad_request("Invalid category ID format", e.to_string())
        })?),
    };

    let events = state
        .events
        .list_events(category_id, limit.value)
        .await
        .map_err(|e| ApiError::from_store("Error getting events", EVENT_NOT_FOUND, e))?;

    Ok(Json(json!({
        "events": events,
        "count": events.len(),
        "limit": limit.value,
        "limit_clamped": limit.clamped,
    })))
}

// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, EVENT_NOT_FOUND)?;
    let event = state
        .events
        .get_event(id)
        .await
        .map_err(|e| ApiError::from_store("Error getting event", EVENT_NOT_FOUND, e))?;

    Ok(Json(json!({ "event": event })))
}

// POST /api/events
async fn create_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_body("Invalid event data", e))?;

    let event = state.events.create_event(req).await.map_err(|e| {
        ApiError::from_service("Invalid event data", "Error creating event", EVENT_NOT_FOUND, e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Event created successfully",
            "event": event,
        })),
    ))
}

// PUT /api/events/{id}
async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<EventPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, EVENT_NOT_FOUND)?;
    let Json(patch) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            // 404 wins over a bad body
            state
                .events
                .get_event(id)
                .await
                .map_err(|e| ApiError::from_store("Error getting event", EVENT_NOT_FOUND, e))?;
            return Err(ApiError::invalid_body("Invalid update data", rejection));
        }
    };

    let event = state
        .events
        .update_event(id, &patch)
        .await
        .map_err(|e| ApiError::from_store("Error updating event", EVENT_NOT_FOUND, e))?;

    Ok(Json(json!({
        "message": "Event updated successfully",
        "event": event,
    })))
}

// DELETE /api/events/{id}
async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, EVENT_NOT_FOUND)?;
    state
        .events
        .delete_event(id)
        .await
        .map_err(|e| ApiError::from_store("Error deleting event", EVENT_NOT_FOUND, e))?;

    // the event is gone either way; a leftover blob is only logged
    if let Err(e) = state
        .objects
        .delete_object(&state.config.storage.bucket_name, &image_key(id))
        .await
    {
        warn!(event_id = %id, "Failed to remove event image: {}", e);
    }

    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

/* ---------- IMAGES ---------- */

// PUT /api/events/{id}/image
async fn upload_event_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, EVENT_NOT_FOUND)?;
    if body.is_empty() {
        return Err(ApiError::bad_request("Invalid image data", "request body is empty"));
    }
    state
        .events
        .get_event(id)
        .await
        .map_err(|e| ApiError::from_store("Error getting event", EVENT_NOT_FOUND, e))?;

    let key = image_key(id);
    state
        .objects
        .put_object(&state.config.storage.bucket_name, &key, body.to_vec())
        .await
        .map_err(|e| ApiError::from_object_store("Error storing image", e))?;

    Ok(Json(json!({
        "message": "Image stored successfully",
        "key": key,
    })))
}

// GET /api/events/{id}/image
async fn get_event_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, EVENT_NOT_FOUND)?;
    state
        .events
        .get_event(id)
        .await
        .map_err(|e| ApiError::from_store("Error getting event", EVENT_NOT_FOUND, e))?;

    let body = state
        .objects
        .get_object(&state.config.storage.bucket_name, &image_key(id))
        .await
        .map_err(|e| ApiError::from_object_store("Image not found", e))?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], body))
}
