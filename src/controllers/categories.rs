use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use super::events::parse_id;
use crate::error::ApiError;
use crate::models::CreateCategoryRequest;
use crate::AppState;

const CATEGORY_NOT_FOUND: &str = "Category not found";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", post(create_category))
        .route("/categories/{id}", get(get_category))
}

// POST /api/categories
async fn create_category(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_body("Invalid category data", e))?;

    let category = state.categories.create_category(req).await.map_err(|e| {
        ApiError::from_service(
            "Invalid category data",
            "Error creating category",
            CATEGORY_NOT_FOUND,
            e,
        )
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Category created successfully",
            "category": category,
        })),
    ))
}

// GET /api/categories/{id}
async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, CATEGORY_NOT_FOUND)?;
    let category = state
        .categories
        .get_category(id)
        .await
        .map_err(|e| ApiError::from_store("Error getting category", CATEGORY_NOT_FOUND, e))?;

    Ok(Json(json!({ "category": category })))
}
