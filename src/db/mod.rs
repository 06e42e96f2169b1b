use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{item_config_results, item_configs, test_config_results, test_configs};

pub mod migrator;
pub mod repositories;

pub use repositories::item_config::ItemConfigInput;
pub use repositories::item_config_result::ItemConfigResultInput;
pub use repositories::password_reset::ResetToken;
pub use repositories::test_config_result::TestConfigResultInput;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn password_reset_repo(&self) -> repositories::password_reset::PasswordResetRepository {
        repositories::password_reset::PasswordResetRepository::new(self.conn.clone())
    }

    fn item_config_repo(&self) -> repositories::item_config::ItemConfigRepository {
        repositories::item_config::ItemConfigRepository::new(self.conn.clone())
    }

    fn test_config_repo(&self) -> repositories::test_config::TestConfigRepository {
        repositories::test_config::TestConfigRepository::new(self.conn.clone())
    }

    fn item_config_result_repo(
        &self,
    ) -> repositories::item_config_result::ItemConfigResultRepository {
        repositories::item_config_result::ItemConfigResultRepository::new(self.conn.clone())
    }

    fn test_config_result_repo(
        &self,
    ) -> repositories::test_config_result::TestConfigResultRepository {
        repositories::test_config_result::TestConfigResultRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: Option<String>,
    ) -> Result<User> {
        self.user_repo()
            .create(username, email, hashed_password)
            .await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, Option<String>)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn set_user_issued_at(&self, user_id: i32, issued_at: i64) -> Result<()> {
        self.user_repo().set_issued_at(user_id, issued_at).await
    }

    pub async fn set_user_password(&self, user_id: i32, hashed_password: String) -> Result<()> {
        self.user_repo()
            .set_password(user_id, hashed_password)
            .await
    }

    // Password reset tokens

    pub async fn create_reset_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: i64,
    ) -> Result<ResetToken> {
        self.password_reset_repo()
            .create(user_id, token, expires_at)
            .await
    }

    pub async fn get_reset_token(&self, token: &str) -> Result<Option<ResetToken>> {
        self.password_reset_repo().get(token).await
    }

    pub async fn delete_reset_token(&self, token: &str) -> Result<()> {
        self.password_reset_repo().delete(token).await
    }

    // Item configs

    pub async fn create_item_config(
        &self,
        input: &ItemConfigInput,
        user_id: Option<i32>,
    ) -> Result<item_configs::Model> {
        self.item_config_repo().create(input, user_id).await
    }

    pub async fn list_item_configs(&self) -> Result<Vec<item_configs::Model>> {
        self.item_config_repo().list().await
    }

    pub async fn get_item_config(&self, id: i32) -> Result<Option<item_configs::Model>> {
        self.item_config_repo().get(id).await
    }

    pub async fn update_item_config(
        &self,
        id: i32,
        input: &ItemConfigInput,
    ) -> Result<Option<item_configs::Model>> {
        self.item_config_repo().update(id, input).await
    }

    pub async fn delete_item_config(&self, id: i32) -> Result<Option<item_configs::Model>> {
        self.item_config_repo().delete(id).await
    }

    pub async fn count_item_configs_for_test_config(&self, test_config_id: i32) -> Result<u64> {
        self.item_config_repo()
            .count_for_test_config(test_config_id)
            .await
    }

    pub async fn insert_item_configs_for_test_config(
        &self,
        inputs: &[ItemConfigInput],
        test_config_id: i32,
    ) -> Result<()> {
        self.item_config_repo()
            .insert_for_test_config(inputs, test_config_id)
            .await
    }

    pub async fn sample_item_configs_for_test_config(
        &self,
        test_config_id: i32,
        limit: u64,
    ) -> Result<Vec<item_configs::Model>> {
        self.item_config_repo()
            .sample_for_test_config(test_config_id, limit)
            .await
    }

    // Test configs

    pub async fn create_test_config(
        &self,
        name: &str,
        item_config_ids: &[i32],
        user_id: Option<i32>,
    ) -> Result<test_configs::Model> {
        self.test_config_repo()
            .create(name, item_config_ids, user_id)
            .await
    }

    pub async fn list_test_configs(&self) -> Result<Vec<test_configs::Model>> {
        self.test_config_repo().list().await
    }

    pub async fn get_test_config(&self, id: i32) -> Result<Option<test_configs::Model>> {
        self.test_config_repo().get(id).await
    }

    pub async fn get_test_config_items(
        &self,
        test_config_id: i32,
    ) -> Result<Vec<item_configs::Model>> {
        self.test_config_repo().item_configs_for(test_config_id).await
    }

    pub async fn update_test_config(
        &self,
        id: i32,
        name: &str,
        item_config_ids: &[i32],
    ) -> Result<Option<test_configs::Model>> {
        self.test_config_repo()
            .update(id, name, item_config_ids)
            .await
    }

    pub async fn delete_test_config(&self, id: i32) -> Result<Option<test_configs::Model>> {
        self.test_config_repo().delete(id).await
    }

    // Item config results

    pub async fn create_item_config_result(
        &self,
        input: &ItemConfigResultInput,
        user_id: i32,
    ) -> Result<item_config_results::Model> {
        self.item_config_result_repo().create(input, user_id).await
    }

    pub async fn get_item_config_result(
        &self,
        id: i32,
    ) -> Result<Option<item_config_results::Model>> {
        self.item_config_result_repo().get(id).await
    }

    pub async fn list_item_config_results_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<item_config_results::Model>> {
        self.item_config_result_repo().list_for_user(user_id).await
    }

    pub async fn list_item_config_results_for_item_config(
        &self,
        item_config_id: i32,
        user_id: i32,
    ) -> Result<Vec<item_config_results::Model>> {
        self.item_config_result_repo()
            .list_for_item_config(item_config_id, user_id)
            .await
    }

    pub async fn list_item_config_results_for_run(
        &self,
        test_config_result_id: i32,
    ) -> Result<Vec<item_config_results::Model>> {
        self.item_config_result_repo()
            .list_for_test_config_result(test_config_result_id)
            .await
    }

    // Test config results

    pub async fn create_test_config_result(
        &self,
        input: &TestConfigResultInput,
        user_id: i32,
    ) -> Result<test_config_results::Model> {
        let model = self.test_config_result_repo().create(input, user_id).await?;

        self.item_config_result_repo()
            .assign_to_test_config_result(model.id, &input.item_config_result_ids)
            .await?;

        Ok(model)
    }

    pub async fn get_test_config_result(
        &self,
        id: i32,
    ) -> Result<Option<test_config_results::Model>> {
        self.test_config_result_repo().get(id).await
    }

    pub async fn list_test_config_results_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<test_config_results::Model>> {
        self.test_config_result_repo().list_for_user(user_id).await
    }

    pub async fn list_test_config_results_for_test_config(
        &self,
        test_config_id: i32,
        user_id: i32,
    ) -> Result<Vec<test_config_results::Model>> {
        self.test_config_result_repo()
            .list_for_test_config(test_config_id, user_id)
            .await
    }

    pub async fn update_test_config_result(
        &self,
        id: i32,
        input: &TestConfigResultInput,
    ) -> Result<Option<test_config_results::Model>> {
        let Some(model) = self.test_config_result_repo().update(id, input).await? else {
            return Ok(None);
        };

        self.item_config_result_repo()
            .assign_to_test_config_result(model.id, &input.item_config_result_ids)
            .await?;

        Ok(Some(model))
    }

    pub async fn delete_test_config_result(
        &self,
        id: i32,
    ) -> Result<Option<test_config_results::Model>> {
        self.test_config_result_repo().delete(id).await
    }
}
