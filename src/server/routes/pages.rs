use crate::db::GeneratedPage;
use crate::error::ForgeError;
use crate::server::guards::RequireAdminKey;
use crate::server::router::ForgeState;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreatePageRequest {
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub deleted: u64,
}

/// `DELETE /pages/{id}` is only routed when `admin_enabled`.
pub fn router(admin_enabled: bool) -> Router<ForgeState> {
    let by_id = if admin_enabled {
        get(get_page).delete(delete_page)
    } else {
        get(get_page)
    };

    Router::new()
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/{id}", by_id)
}

pub async fn create_page(
    State(state): State<ForgeState>,
    payload: Result<Json<CreatePageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GeneratedPage>), ForgeError> {
    let Json(body) = payload?;
    let page = state.pages.create_page(&body.prompt).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

pub async fn list_pages(
    State(state): State<ForgeState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<GeneratedPage>>, ForgeError> {
    let Query(query) = query.map_err(|_| {
        ForgeError::ValidationFailed("limit must be a positive integer".to_string())
    })?;
    let pages = state.pages.list_pages(query.limit).await?;
    Ok(Json(pages))
}

pub async fn get_page(
    State(state): State<ForgeState>,
    Path(id): Path<String>,
) -> Result<Json<GeneratedPage>, ForgeError> {
    Ok(Json(state.pages.find_page(&id).await?))
}

pub async fn delete_page(
    _admin: RequireAdminKey,
    State(state): State<ForgeState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ForgeError> {
    let deleted = state.pages.delete_page(&id).await?;
    Ok(Json(DeleteResult { deleted }))
}
