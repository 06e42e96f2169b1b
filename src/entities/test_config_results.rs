use sea_orm::entity::prelude::*;

/// Aggregate outcome of one run through a test config. Member item
/// results point back here via their `test_config_result_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "test_config_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created: String,

    pub user_id: Option<i32>,

    pub test_config_id: i32,

    /// When the run took place (client-reported, RFC3339).
    pub time: String,

    pub correct_answers: i32,

    pub wrong_answers: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
