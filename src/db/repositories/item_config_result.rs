use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};

use crate::entities::item_config_results;

#[derive(Debug, Clone)]
pub struct ItemConfigResultInput {
    pub item_config_id: i32,
    pub correct: bool,
    pub reaction_time_ms: i32,
    pub response: String,
}

pub struct ItemConfigResultRepository {
    conn: DatabaseConnection,
}

impl ItemConfigResultRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Results are always stamped with the recording user.
    pub async fn create(
        &self,
        input: &ItemConfigResultInput,
        user_id: i32,
    ) -> Result<item_config_results::Model> {
        item_config_results::ActiveModel {
            id: NotSet,
            created: Set(chrono::Utc::now().to_rfc3339()),
            user_id: Set(Some(user_id)),
            item_config_id: Set(input.item_config_id),
            correct: Set(input.correct),
            reaction_time_ms: Set(input.reaction_time_ms),
            response: Set(input.response.clone()),
            test_config_result_id: Set(None),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert item config result")
    }

    pub async fn get(&self, id: i32) -> Result<Option<item_config_results::Model>> {
        item_config_results::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query item config result")
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<item_config_results::Model>> {
        item_config_results::Entity::find()
            .filter(item_config_results::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to list item config results for user")
    }

    /// The caller's own responses to one stimulus.
    pub async fn list_for_item_config(
        &self,
        item_config_id: i32,
        user_id: i32,
    ) -> Result<Vec<item_config_results::Model>> {
        item_config_results::Entity::find()
            .filter(item_config_results::Column::ItemConfigId.eq(item_config_id))
            .filter(item_config_results::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to list item config results for item config")
    }

    pub async fn list_for_test_config_result(
        &self,
        test_config_result_id: i32,
    ) -> Result<Vec<item_config_results::Model>> {
        item_config_results::Entity::find()
            .filter(item_config_results::Column::TestConfigResultId.eq(test_config_result_id))
            .all(&self.conn)
            .await
            .context("Failed to list item config results for battery run")
    }

    /// Point the given item results at a battery run, detaching any
    /// rows previously assigned to it.
    pub async fn assign_to_test_config_result(
        &self,
        test_config_result_id: i32,
        item_config_result_ids: &[i32],
    ) -> Result<()> {
        item_config_results::Entity::update_many()
            .col_expr(
                item_config_results::Column::TestConfigResultId,
                sea_orm::sea_query::Expr::value(Option::<i32>::None),
            )
            .filter(item_config_results::Column::TestConfigResultId.eq(test_config_result_id))
            .exec(&self.conn)
            .await
            .context("Failed to detach previous battery results")?;

        if item_config_result_ids.is_empty() {
            return Ok(());
        }

        item_config_results::Entity::update_many()
            .col_expr(
                item_config_results::Column::TestConfigResultId,
                sea_orm::sea_query::Expr::value(Some(test_config_result_id)),
            )
            .filter(item_config_results::Column::Id.is_in(item_config_result_ids.to_vec()))
            .exec(&self.conn)
            .await
            .context("Failed to attach results to battery run")?;

        Ok(())
    }
}
