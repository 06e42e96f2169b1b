use sea_orm::entity::prelude::*;

/// Join table between test configs and their member item configs.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "test_config_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub test_config_id: i32,

    pub item_config_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
