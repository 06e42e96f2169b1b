pub use super::item_config_results::Entity as ItemConfigResults;
pub use super::item_configs::Entity as ItemConfigs;
pub use super::password_reset_tokens::Entity as PasswordResetTokens;
pub use super::test_config_items::Entity as TestConfigItems;
pub use super::test_config_results::Entity as TestConfigResults;
pub use super::test_configs::Entity as TestConfigs;
pub use super::users::Entity as Users;
