use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{item_configs, test_config_items, test_configs};

pub struct TestConfigRepository {
    conn: DatabaseConnection,
}

impl TestConfigRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        name: &str,
        item_config_ids: &[i32],
        user_id: Option<i32>,
    ) -> Result<test_configs::Model> {
        let model = test_configs::ActiveModel {
            id: NotSet,
            created: Set(chrono::Utc::now().to_rfc3339()),
            name: Set(name.to_string()),
            user_id: Set(user_id),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert test config")?;

        self.link_items(model.id, item_config_ids).await?;

        Ok(model)
    }

    pub async fn list(&self) -> Result<Vec<test_configs::Model>> {
        test_configs::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to list test configs")
    }

    pub async fn get(&self, id: i32) -> Result<Option<test_configs::Model>> {
        test_configs::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query test config")
    }

    /// Member stimuli in insertion order.
    pub async fn item_configs_for(&self, test_config_id: i32) -> Result<Vec<item_configs::Model>> {
        let links = test_config_items::Entity::find()
            .filter(test_config_items::Column::TestConfigId.eq(test_config_id))
            .order_by_asc(test_config_items::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query test config membership")?;

        let ids: Vec<i32> = links.iter().map(|l| l.item_config_id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut items = item_configs::Entity::find()
            .filter(item_configs::Column::Id.is_in(ids.clone()))
            .all(&self.conn)
            .await
            .context("Failed to query member item configs")?;

        // Restore insertion order; `IN` gives no ordering guarantee.
        items.sort_by_key(|item| ids.iter().position(|id| *id == item.id));
        Ok(items)
    }

    /// Replaces name and membership.
    pub async fn update(
        &self,
        id: i32,
        name: &str,
        item_config_ids: &[i32],
    ) -> Result<Option<test_configs::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: test_configs::ActiveModel = existing.into();
        active.name = Set(name.to_string());
        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update test config")?;

        test_config_items::Entity::delete_many()
            .filter(test_config_items::Column::TestConfigId.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to clear test config membership")?;

        self.link_items(id, item_config_ids).await?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<Option<test_configs::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        test_config_items::Entity::delete_many()
            .filter(test_config_items::Column::TestConfigId.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to clear test config membership")?;

        test_configs::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete test config")?;

        Ok(Some(existing))
    }

    async fn link_items(&self, test_config_id: i32, item_config_ids: &[i32]) -> Result<()> {
        for item_config_id in item_config_ids {
            test_config_items::ActiveModel {
                id: NotSet,
                test_config_id: Set(test_config_id),
                item_config_id: Set(*item_config_id),
            }
            .insert(&self.conn)
            .await
            .context("Failed to link item config to test config")?;
        }

        Ok(())
    }
}
