use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};

use crate::entities::users;

/// User data handed out of the repository (never carries the password
/// hash).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub created: String,
    pub username: String,
    pub email: String,
    pub issued_at: Option<i64>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            created: model.created,
            username: model.username,
            email: model.email,
            issued_at: model.issued_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        username: &str,
        email: &str,
        hashed_password: Option<String>,
    ) -> Result<User> {
        let model = users::ActiveModel {
            id: NotSet,
            created: Set(chrono::Utc::now().to_rfc3339()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            hashed_password: Set(hashed_password),
            issued_at: Set(None),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Credential lookup for login: the stored hash is nullable, and a
    /// passwordless account can never authenticate.
    pub async fn get_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(User, Option<String>)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user credentials")?;

        Ok(user.map(|u| {
            let hash = u.hashed_password.clone();
            (User::from(u), hash)
        }))
    }

    /// Advance the session cutover watermark. The watermark only moves
    /// forward; a stale write (clock skew, racing logout) is dropped.
    pub async fn set_issued_at(&self, user_id: i32, issued_at: i64) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for session cutover")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        if user.issued_at.is_some_and(|current| issued_at < current) {
            return Ok(());
        }

        let mut active: users::ActiveModel = user.into();
        active.issued_at = Set(Some(issued_at));
        active
            .update(&self.conn)
            .await
            .context("Failed to persist session cutover")?;

        Ok(())
    }

    pub async fn set_password(&self, user_id: i32, hashed_password: String) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.hashed_password = Set(Some(hashed_password));
        active
            .update(&self.conn)
            .await
            .context("Failed to persist password update")?;

        Ok(())
    }
}
