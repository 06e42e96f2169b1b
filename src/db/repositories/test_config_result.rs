use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};

use crate::entities::{item_config_results, test_config_results};

#[derive(Debug, Clone)]
pub struct TestConfigResultInput {
    pub test_config_id: i32,
    pub time: String,
    pub correct_answers: i32,
    pub wrong_answers: i32,
    pub item_config_result_ids: Vec<i32>,
}

pub struct TestConfigResultRepository {
    conn: DatabaseConnection,
}

impl TestConfigResultRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        input: &TestConfigResultInput,
        user_id: i32,
    ) -> Result<test_config_results::Model> {
        let model = test_config_results::ActiveModel {
            id: NotSet,
            created: Set(chrono::Utc::now().to_rfc3339()),
            user_id: Set(Some(user_id)),
            test_config_id: Set(input.test_config_id),
            time: Set(input.time.clone()),
            correct_answers: Set(input.correct_answers),
            wrong_answers: Set(input.wrong_answers),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert test config result")?;

        Ok(model)
    }

    pub async fn get(&self, id: i32) -> Result<Option<test_config_results::Model>> {
        test_config_results::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query test config result")
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<test_config_results::Model>> {
        test_config_results::Entity::find()
            .filter(test_config_results::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to list test config results for user")
    }

    /// The caller's own runs of one battery.
    pub async fn list_for_test_config(
        &self,
        test_config_id: i32,
        user_id: i32,
    ) -> Result<Vec<test_config_results::Model>> {
        test_config_results::Entity::find()
            .filter(test_config_results::Column::TestConfigId.eq(test_config_id))
            .filter(test_config_results::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to list test config results for test config")
    }

    pub async fn update(
        &self,
        id: i32,
        input: &TestConfigResultInput,
    ) -> Result<Option<test_config_results::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: test_config_results::ActiveModel = existing.into();
        active.test_config_id = Set(input.test_config_id);
        active.time = Set(input.time.clone());
        active.correct_answers = Set(input.correct_answers);
        active.wrong_answers = Set(input.wrong_answers);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update test config result")?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<Option<test_config_results::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        // Detach member results rather than deleting the raw responses.
        item_config_results::Entity::update_many()
            .col_expr(
                item_config_results::Column::TestConfigResultId,
                sea_orm::sea_query::Expr::value(Option::<i32>::None),
            )
            .filter(item_config_results::Column::TestConfigResultId.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to detach results from battery run")?;

        test_config_results::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete test config result")?;

        Ok(Some(existing))
    }
}
