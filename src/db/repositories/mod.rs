pub mod item_config;
pub mod item_config_result;
pub mod password_reset;
pub mod test_config;
pub mod test_config_result;
pub mod user;
