//! Inventory API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Serialize;

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{InventoryCreate, InventoryItem, InventoryUpdate};
use crate::db::repository::InventoryRepository;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_copy_count, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

#[derive(serde::Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(serde::Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// GET /api/inventory - 馆藏列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let items = InventoryRepository::new(state.get_db())
        .find_all(query.limit.min(200), query.offset)
        .await?;
    Ok(Json(items))
}

/// GET /api/inventory/search?q=xxx - 搜索馆藏
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let items = InventoryRepository::new(state.get_db())
        .search(&query.q)
        .await?;
    Ok(Json(items))
}

#[derive(Serialize)]
pub struct Availability {
    pub book_id: String,
    pub title: String,
    pub available_copies: i64,
    pub total_copies: i64,
    pub total_reservations: i64,
}

/// GET /api/inventory/availability/:book_id - 可借查询
pub async fn availability(
    State(state): State<ServerState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<Availability>> {
    let item = InventoryRepository::new(state.get_db())
        .resolve(&book_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Book {}", book_id)))?;
    Ok(Json(Availability {
        book_id: item.book_id,
        title: item.title,
        available_copies: item.available_copies,
        total_copies: item.total_copies,
        total_reservations: item.total_reservations,
    }))
}

/// GET /api/inventory/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<InventoryItem>> {
    let item = InventoryRepository::new(state.get_db())
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Inventory item {}", id)))?;
    Ok(Json(item))
}

/// POST /api/inventory - 新增馆藏
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<InventoryCreate>,
) -> AppResult<Json<InventoryItem>> {
    validate_required_text(&payload.book_id, "book_id", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_optional_text(&payload.author, "author", MAX_NAME_LEN)?;
    validate_optional_text(&payload.call_number, "call_number", MAX_SHORT_TEXT_LEN)?;
    validate_copy_count(payload.total_copies, "total_copies")?;

    let repo = InventoryRepository::new(state.get_db());
    if repo.find_by_book_id(&payload.book_id).await?.is_some() {
        return Err(AppError::conflict(format!(
            "Inventory already tracks book {}",
            payload.book_id
        )));
    }

    let now = shared::util::now_millis();
    let item = InventoryItem {
        id: None,
        book_id: payload.book_id,
        title: payload.title,
        author: payload.author,
        call_number: payload.call_number,
        material_type: payload.material_type,
        available_copies: payload.total_copies,
        total_copies: payload.total_copies,
        total_checkouts: 0,
        total_reservations: 0,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let item = repo.create(item).await?;

    state
        .audit
        .log(
            AuditAction::InventoryCreated,
            "inventory",
            item.book_id.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({ "title": item.title, "total_copies": item.total_copies }),
        )
        .await;

    Ok(Json(item))
}

/// PUT /api/inventory/:id - 更新馆藏
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<InventoryUpdate>,
) -> AppResult<Json<InventoryItem>> {
    validate_optional_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_optional_text(&payload.author, "author", MAX_NAME_LEN)?;
    validate_optional_text(&payload.call_number, "call_number", MAX_SHORT_TEXT_LEN)?;
    if let Some(total) = payload.total_copies {
        validate_copy_count(total, "total_copies")?;
    }

    let item = InventoryRepository::new(state.get_db())
        .update(&id, payload)
        .await?;

    state
        .audit
        .log(
            AuditAction::InventoryUpdated,
            "inventory",
            item.book_id.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({}),
        )
        .await;

    Ok(Json(item))
}

/// DELETE /api/inventory/:id - 删除馆藏
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = InventoryRepository::new(state.get_db());
    let existing = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Inventory item {}", id)))?;

    repo.delete(&id).await?;

    state
        .audit
        .log(
            AuditAction::InventoryDeleted,
            "inventory",
            existing.book_id.clone(),
            Some(user.id.clone()),
            Some(user.display_name.clone()),
            serde_json::json!({ "title": existing.title }),
        )
        .await;

    Ok(Json(true))
}
