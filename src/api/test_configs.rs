use axum::Json;
use axum::extract::{Path, State};
use std::sync::Arc;

use crate::api::auth::CurrentUser;
use crate::api::{ApiError, AppState, TestConfigDto, TestConfigRequest};
use crate::db::Store;
use crate::entities::test_configs;

async fn hydrate(store: &Store, model: test_configs::Model) -> Result<TestConfigDto, ApiError> {
    let items = store.get_test_config_items(model.id).await?;
    Ok(TestConfigDto::from_parts(model, items))
}

pub async fn create_test_config(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<TestConfigRequest>,
) -> Result<Json<TestConfigDto>, ApiError> {
    let model = state
        .store
        .create_test_config(&payload.name, &payload.item_config_ids, Some(user.id))
        .await?;

    Ok(Json(hydrate(&state.store, model).await?))
}

pub async fn list_test_configs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TestConfigDto>>, ApiError> {
    let models = state.store.list_test_configs().await?;

    let mut out = Vec::with_capacity(models.len());
    for model in models {
        out.push(hydrate(&state.store, model).await?);
    }
    Ok(Json(out))
}

pub async fn get_test_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<TestConfigDto>, ApiError> {
    let model = state
        .store
        .get_test_config(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Test Config", id))?;

    Ok(Json(hydrate(&state.store, model).await?))
}

pub async fn update_test_config(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<TestConfigRequest>,
) -> Result<Json<TestConfigDto>, ApiError> {
    let existing = state
        .store
        .get_test_config(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Test Config", id))?;

    if existing.user_id != Some(user.id) {
        return Err(ApiError::not_owner(user.id, "test config", id));
    }

    let model = state
        .store
        .update_test_config(id, &payload.name, &payload.item_config_ids)
        .await?
        .ok_or_else(|| ApiError::not_found("Test Config", id))?;

    Ok(Json(hydrate(&state.store, model).await?))
}

pub async fn delete_test_config(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<TestConfigDto>, ApiError> {
    let existing = state
        .store
        .get_test_config(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Test Config", id))?;

    if existing.user_id != Some(user.id) {
        return Err(ApiError::not_owner(user.id, "test config", id));
    }

    // Snapshot the membership before the links are removed.
    let items = state.store.get_test_config_items(id).await?;

    let model = state
        .store
        .delete_test_config(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Test Config", id))?;

    Ok(Json(TestConfigDto::from_parts(model, items)))
}
