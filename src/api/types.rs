use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::entities::{item_config_results, item_configs, test_config_results, test_configs};

// Users

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// OAuth2 password form: the `username` field carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub created: String,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created: user.created,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct MsgResponse {
    pub msg: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

// Item configs

#[derive(Debug, Deserialize)]
pub struct ItemConfigRequest {
    pub triangle_size: i32,
    pub triangle_color: String,
    pub circle_size: i32,
    pub circle_color: String,
    pub time_visible_ms: i32,
    pub orientation: String,
}

#[derive(Debug, Serialize)]
pub struct ItemConfigDto {
    pub id: i32,
    pub created: String,
    pub triangle_size: i32,
    pub triangle_color: String,
    pub circle_size: i32,
    pub circle_color: String,
    pub time_visible_ms: i32,
    pub orientation: String,
}

impl From<item_configs::Model> for ItemConfigDto {
    fn from(model: item_configs::Model) -> Self {
        Self {
            id: model.id,
            created: model.created,
            triangle_size: model.triangle_size,
            triangle_color: model.triangle_color,
            circle_size: model.circle_size,
            circle_color: model.circle_color,
            time_visible_ms: model.time_visible_ms,
            orientation: model.orientation,
        }
    }
}

// Test configs

#[derive(Debug, Deserialize)]
pub struct TestConfigRequest {
    pub name: String,
    pub item_config_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct TestConfigDto {
    pub id: i32,
    pub created: String,
    pub user_id: Option<i32>,
    pub name: String,
    pub item_configs: Vec<ItemConfigDto>,
}

impl TestConfigDto {
    #[must_use]
    pub fn from_parts(model: test_configs::Model, items: Vec<item_configs::Model>) -> Self {
        Self {
            id: model.id,
            created: model.created,
            user_id: model.user_id,
            name: model.name,
            item_configs: items.into_iter().map(ItemConfigDto::from).collect(),
        }
    }
}

// Item config results

#[derive(Debug, Deserialize)]
pub struct ItemConfigResultRequest {
    pub item_config_id: i32,
    pub correct: bool,
    pub reaction_time_ms: i32,
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ItemConfigResultDto {
    pub id: i32,
    pub created: String,
    pub user_id: Option<i32>,
    pub item_config_id: i32,
    pub correct: bool,
    pub reaction_time_ms: i32,
    pub response: String,
}

impl From<item_config_results::Model> for ItemConfigResultDto {
    fn from(model: item_config_results::Model) -> Self {
        Self {
            id: model.id,
            created: model.created,
            user_id: model.user_id,
            item_config_id: model.item_config_id,
            correct: model.correct,
            reaction_time_ms: model.reaction_time_ms,
            response: model.response,
        }
    }
}

// Test config results

#[derive(Debug, Deserialize)]
pub struct TestConfigResultRequest {
    pub test_config_id: i32,
    pub time: String,
    pub correct_answers: i32,
    pub wrong_answers: i32,
    pub item_config_result_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct TestConfigResultDto {
    pub id: i32,
    pub created: String,
    pub user_id: Option<i32>,
    pub test_config_id: i32,
    pub time: String,
    pub correct_answers: i32,
    pub wrong_answers: i32,
    pub item_config_results: Vec<ItemConfigResultDto>,
}

impl TestConfigResultDto {
    #[must_use]
    pub fn from_parts(
        model: test_config_results::Model,
        items: Vec<item_config_results::Model>,
    ) -> Self {
        Self {
            id: model.id,
            created: model.created,
            user_id: model.user_id,
            test_config_id: model.test_config_id,
            time: model.time,
            correct_answers: model.correct_answers,
            wrong_answers: model.wrong_answers,
            item_config_results: items.into_iter().map(ItemConfigResultDto::from).collect(),
        }
    }
}
