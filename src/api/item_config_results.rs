use axum::Json;
use axum::extract::{Path, State};
use std::sync::Arc;

use crate::api::auth::CurrentUser;
use crate::api::{ApiError, AppState, ItemConfigResultDto, ItemConfigResultRequest};
use crate::db::ItemConfigResultInput;

pub async fn create_item_config_result(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ItemConfigResultRequest>,
) -> Result<Json<ItemConfigResultDto>, ApiError> {
    let input = ItemConfigResultInput {
        item_config_id: payload.item_config_id,
        correct: payload.correct,
        reaction_time_ms: payload.reaction_time_ms,
        response: payload.response,
    };

    let model = state
        .store
        .create_item_config_result(&input, user.id)
        .await?;

    Ok(Json(ItemConfigResultDto::from(model)))
}

pub async fn list_for_current_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ItemConfigResultDto>>, ApiError> {
    let models = state
        .store
        .list_item_config_results_for_user(user.id)
        .await?;

    Ok(Json(
        models.into_iter().map(ItemConfigResultDto::from).collect(),
    ))
}

pub async fn list_for_item_config(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(item_config_id): Path<i32>,
) -> Result<Json<Vec<ItemConfigResultDto>>, ApiError> {
    let models = state
        .store
        .list_item_config_results_for_item_config(item_config_id, user.id)
        .await?;

    Ok(Json(
        models.into_iter().map(ItemConfigResultDto::from).collect(),
    ))
}

pub async fn get_item_config_result(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ItemConfigResultDto>, ApiError> {
    let model = state
        .store
        .get_item_config_result(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item Config Result", id))?;

    if model.user_id != Some(user.id) {
        return Err(ApiError::Unauthorized(format!(
            "User {} does not have access to Item Config Result with id {}",
            user.id, id
        )));
    }

    Ok(Json(ItemConfigResultDto::from(model)))
}
