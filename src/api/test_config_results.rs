use axum::Json;
use axum::extract::{Path, State};
use std::sync::Arc;

use crate::api::auth::CurrentUser;
use crate::api::{ApiError, AppState, TestConfigResultDto, TestConfigResultRequest};
use crate::db::{Store, TestConfigResultInput};
use crate::entities::test_config_results;

fn to_input(payload: &TestConfigResultRequest) -> TestConfigResultInput {
    TestConfigResultInput {
        test_config_id: payload.test_config_id,
        time: payload.time.clone(),
        correct_answers: payload.correct_answers,
        wrong_answers: payload.wrong_answers,
        item_config_result_ids: payload.item_config_result_ids.clone(),
    }
}

async fn hydrate(
    store: &Store,
    model: test_config_results::Model,
) -> Result<TestConfigResultDto, ApiError> {
    let items = store.list_item_config_results_for_run(model.id).await?;
    Ok(TestConfigResultDto::from_parts(model, items))
}

fn not_authorized(user_id: i32, action: &str, id: i32) -> ApiError {
    ApiError::Unauthorized(format!(
        "User {user_id} is not authorized to {action} test config result {id}"
    ))
}

pub async fn create_test_config_result(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<TestConfigResultRequest>,
) -> Result<Json<TestConfigResultDto>, ApiError> {
    let model = state
        .store
        .create_test_config_result(&to_input(&payload), user.id)
        .await?;

    Ok(Json(hydrate(&state.store, model).await?))
}

pub async fn list_for_current_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TestConfigResultDto>>, ApiError> {
    let models = state
        .store
        .list_test_config_results_for_user(user.id)
        .await?;

    let mut out = Vec::with_capacity(models.len());
    for model in models {
        out.push(hydrate(&state.store, model).await?);
    }
    Ok(Json(out))
}

pub async fn list_for_test_config(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(test_config_id): Path<i32>,
) -> Result<Json<Vec<TestConfigResultDto>>, ApiError> {
    let models = state
        .store
        .list_test_config_results_for_test_config(test_config_id, user.id)
        .await?;

    let mut out = Vec::with_capacity(models.len());
    for model in models {
        out.push(hydrate(&state.store, model).await?);
    }
    Ok(Json(out))
}

pub async fn get_test_config_result(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<TestConfigResultDto>, ApiError> {
    let model = state
        .store
        .get_test_config_result(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("TestConfigResult not found".to_string()))?;

    if model.user_id != Some(user.id) {
        return Err(not_authorized(user.id, "access", id));
    }

    Ok(Json(hydrate(&state.store, model).await?))
}

pub async fn update_test_config_result(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<TestConfigResultRequest>,
) -> Result<Json<TestConfigResultDto>, ApiError> {
    let existing = state
        .store
        .get_test_config_result(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("TestConfigResult not found".to_string()))?;

    if existing.user_id != Some(user.id) {
        return Err(not_authorized(user.id, "update", id));
    }

    let model = state
        .store
        .update_test_config_result(id, &to_input(&payload))
        .await?
        .ok_or_else(|| ApiError::NotFound("TestConfigResult not found".to_string()))?;

    Ok(Json(hydrate(&state.store, model).await?))
}

pub async fn delete_test_config_result(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<TestConfigResultDto>, ApiError> {
    let existing = state
        .store
        .get_test_config_result(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("TestConfigResult not found".to_string()))?;

    if existing.user_id != Some(user.id) {
        return Err(not_authorized(user.id, "delete", id));
    }

    // Snapshot the member results before they are detached.
    let items = state.store.list_item_config_results_for_run(id).await?;

    let model = state
        .store
        .delete_test_config_result(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("TestConfigResult not found".to_string()))?;

    Ok(Json(TestConfigResultDto::from_parts(model, items)))
}
