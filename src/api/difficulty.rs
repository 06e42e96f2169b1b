use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::{ApiError, AppState, ItemConfigDto};
use crate::stimulus::{self, Difficulty};

#[derive(Debug, Deserialize)]
pub struct DifficultyQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    500
}

/// Random item configs drawn from the preset battery for a difficulty
/// level. When the pool is smaller than the requested limit it is
/// topped up with freshly generated stimuli first.
pub async fn get_by_difficulty(
    State(state): State<Arc<AppState>>,
    Path(level): Path<String>,
    Query(query): Query<DifficultyQuery>,
) -> Result<Json<Vec<ItemConfigDto>>, ApiError> {
    let difficulty = Difficulty::parse(&level)
        .ok_or_else(|| ApiError::NotFound("Invalid difficulty level".to_string()))?;

    let test_config_id = difficulty.test_config_id();
    let current = state
        .store
        .count_item_configs_for_test_config(test_config_id)
        .await?;

    if current < query.limit {
        let missing = usize::try_from(query.limit - current)
            .map_err(|_| ApiError::validation("limit out of range"))?;
        let batch = stimulus::generate_batch(difficulty, missing)
            .map_err(|e| ApiError::internal(e.to_string()))?;

        state
            .store
            .insert_item_configs_for_test_config(&batch, test_config_id)
            .await?;

        info!(
            difficulty = %level,
            generated = missing,
            "Topped up item config pool"
        );
    }

    let models = state
        .store
        .sample_item_configs_for_test_config(test_config_id, query.limit)
        .await?;

    Ok(Json(models.into_iter().map(ItemConfigDto::from).collect()))
}
