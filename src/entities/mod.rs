pub mod prelude;

pub mod item_config_results;
pub mod item_configs;
pub mod password_reset_tokens;
pub mod test_config_items;
pub mod test_config_results;
pub mod test_configs;
pub mod users;
