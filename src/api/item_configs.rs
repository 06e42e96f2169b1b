use axum::Json;
use axum::extract::{Path, State};
use std::sync::Arc;

use crate::api::auth::CurrentUser;
use crate::api::{ApiError, AppState, ItemConfigDto, ItemConfigRequest};
use crate::db::ItemConfigInput;

fn to_input(payload: &ItemConfigRequest) -> ItemConfigInput {
    ItemConfigInput {
        triangle_size: payload.triangle_size,
        triangle_color: payload.triangle_color.clone(),
        circle_size: payload.circle_size,
        circle_color: payload.circle_color.clone(),
        time_visible_ms: payload.time_visible_ms,
        orientation: payload.orientation.clone(),
    }
}

pub async fn create_item_config(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ItemConfigRequest>,
) -> Result<Json<ItemConfigDto>, ApiError> {
    let model = state
        .store
        .create_item_config(&to_input(&payload), Some(user.id))
        .await?;

    Ok(Json(ItemConfigDto::from(model)))
}

pub async fn list_item_configs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ItemConfigDto>>, ApiError> {
    let models = state.store.list_item_configs().await?;
    Ok(Json(models.into_iter().map(ItemConfigDto::from).collect()))
}

pub async fn get_item_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ItemConfigDto>, ApiError> {
    let model = state
        .store
        .get_item_config(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item Config", id))?;

    Ok(Json(ItemConfigDto::from(model)))
}

pub async fn update_item_config(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<ItemConfigRequest>,
) -> Result<Json<ItemConfigDto>, ApiError> {
    let existing = state
        .store
        .get_item_config(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item Config", id))?;

    if existing.user_id != Some(user.id) {
        return Err(ApiError::not_owner(user.id, "item config", id));
    }

    let model = state
        .store
        .update_item_config(id, &to_input(&payload))
        .await?
        .ok_or_else(|| ApiError::not_found("Item Config", id))?;

    Ok(Json(ItemConfigDto::from(model)))
}

pub async fn delete_item_config(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ItemConfigDto>, ApiError> {
    let existing = state
        .store
        .get_item_config(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item Config", id))?;

    if existing.user_id != Some(user.id) {
        return Err(ApiError::not_owner(user.id, "item config", id));
    }

    let model = state
        .store
        .delete_item_config(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item Config", id))?;

    Ok(Json(ItemConfigDto::from(model)))
}
