use sea_orm::entity::prelude::*;

/// A named battery of stimuli, linked to item configs via
/// `test_config_items`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "test_configs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created: String,

    pub name: String,

    pub user_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
