use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{item_config_results, item_configs, test_config_items};

/// Field set accepted on create/update.
#[derive(Debug, Clone)]
pub struct ItemConfigInput {
    pub triangle_size: i32,
    pub triangle_color: String,
    pub circle_size: i32,
    pub circle_color: String,
    pub time_visible_ms: i32,
    pub orientation: String,
}

pub struct ItemConfigRepository {
    conn: DatabaseConnection,
}

impl ItemConfigRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        input: &ItemConfigInput,
        user_id: Option<i32>,
    ) -> Result<item_configs::Model> {
        let model = active_model_from(input, user_id)
            .insert(&self.conn)
            .await
            .context("Failed to insert item config")?;

        Ok(model)
    }

    pub async fn list(&self) -> Result<Vec<item_configs::Model>> {
        item_configs::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to list item configs")
    }

    pub async fn get(&self, id: i32) -> Result<Option<item_configs::Model>> {
        item_configs::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query item config")
    }

    pub async fn update(
        &self,
        id: i32,
        input: &ItemConfigInput,
    ) -> Result<Option<item_configs::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: item_configs::ActiveModel = existing.into();
        active.triangle_size = Set(input.triangle_size);
        active.triangle_color = Set(input.triangle_color.clone());
        active.circle_size = Set(input.circle_size);
        active.circle_color = Set(input.circle_color.clone());
        active.time_visible_ms = Set(input.time_visible_ms);
        active.orientation = Set(input.orientation.clone());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update item config")?;

        Ok(Some(model))
    }

    /// Delete a stimulus along with every recorded response to it and
    /// its battery memberships.
    pub async fn delete(&self, id: i32) -> Result<Option<item_configs::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        item_config_results::Entity::delete_many()
            .filter(item_config_results::Column::ItemConfigId.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to delete results for item config")?;

        test_config_items::Entity::delete_many()
            .filter(test_config_items::Column::ItemConfigId.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to unlink item config from test configs")?;

        item_configs::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete item config")?;

        Ok(Some(existing))
    }

    /// How many stimuli belong to a given test config.
    pub async fn count_for_test_config(&self, test_config_id: i32) -> Result<u64> {
        test_config_items::Entity::find()
            .filter(test_config_items::Column::TestConfigId.eq(test_config_id))
            .count(&self.conn)
            .await
            .context("Failed to count item configs for test config")
    }

    /// Insert generated stimuli and attach them to a test config in one
    /// pass. Generated stimuli carry no owner.
    pub async fn insert_for_test_config(
        &self,
        inputs: &[ItemConfigInput],
        test_config_id: i32,
    ) -> Result<()> {
        for input in inputs {
            let model = active_model_from(input, None)
                .insert(&self.conn)
                .await
                .context("Failed to insert generated item config")?;

            test_config_items::ActiveModel {
                id: NotSet,
                test_config_id: Set(test_config_id),
                item_config_id: Set(model.id),
            }
            .insert(&self.conn)
            .await
            .context("Failed to link generated item config")?;
        }

        Ok(())
    }

    /// Random sample of stimuli belonging to a test config.
    pub async fn sample_for_test_config(
        &self,
        test_config_id: i32,
        limit: u64,
    ) -> Result<Vec<item_configs::Model>> {
        let ids: Vec<i32> = test_config_items::Entity::find()
            .filter(test_config_items::Column::TestConfigId.eq(test_config_id))
            .all(&self.conn)
            .await
            .context("Failed to query test config membership")?
            .into_iter()
            .map(|row| row.item_config_id)
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        item_configs::Entity::find()
            .filter(item_configs::Column::Id.is_in(ids))
            .order_by(Expr::cust("RANDOM()"), Order::Asc)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to sample item configs")
    }
}

fn active_model_from(input: &ItemConfigInput, user_id: Option<i32>) -> item_configs::ActiveModel {
    item_configs::ActiveModel {
        id: NotSet,
        created: Set(chrono::Utc::now().to_rfc3339()),
        triangle_size: Set(input.triangle_size),
        triangle_color: Set(input.triangle_color.clone()),
        circle_size: Set(input.circle_size),
        circle_color: Set(input.circle_color.clone()),
        time_visible_ms: Set(input.time_visible_ms),
        orientation: Set(input.orientation.clone()),
        user_id: Set(user_id),
    }
}
