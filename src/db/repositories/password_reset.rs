use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, NotSet,
    QueryFilter, Set,
};

use crate::entities::password_reset_tokens;

#[derive(Debug, Clone)]
pub struct ResetToken {
    pub token: String,
    pub user_id: i32,
    pub expires_at: i64,
}

impl From<password_reset_tokens::Model> for ResetToken {
    fn from(model: password_reset_tokens::Model) -> Self {
        Self {
            token: model.token,
            user_id: model.user_id,
            expires_at: model.expires_at,
        }
    }
}

pub struct PasswordResetRepository {
    conn: DatabaseConnection,
}

impl PasswordResetRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Persist a fresh reset token. One row per request; earlier
    /// unconsumed tokens for the same user stay valid until they expire.
    pub async fn create(&self, user_id: i32, token: &str, expires_at: i64) -> Result<ResetToken> {
        let model = password_reset_tokens::ActiveModel {
            id: NotSet,
            token: Set(token.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert password reset token")?;

        Ok(ResetToken::from(model))
    }

    pub async fn get(&self, token: &str) -> Result<Option<ResetToken>> {
        let row = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query password reset token")?;

        Ok(row.map(ResetToken::from))
    }

    /// Consume a token (single use). A no-op when the row is already
    /// gone.
    pub async fn delete(&self, token: &str) -> Result<()> {
        let row = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query password reset token for deletion")?;

        if let Some(row) = row {
            row.delete(&self.conn)
                .await
                .context("Failed to delete consumed password reset token")?;
        }

        Ok(())
    }
}
