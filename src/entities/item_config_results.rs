use sea_orm::entity::prelude::*;

/// A single recorded response to one stimulus.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "item_config_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created: String,

    pub user_id: Option<i32>,

    pub item_config_id: i32,

    pub correct: bool,

    pub reaction_time_ms: i32,

    /// The orientation the participant reported.
    pub response: String,

    /// Set when the result is attached to a battery run.
    pub test_config_result_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
