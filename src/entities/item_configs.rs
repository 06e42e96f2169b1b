use sea_orm::entity::prelude::*;

/// A single triangle-in-circle stimulus definition.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "item_configs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created: String,

    pub triangle_size: i32,

    pub triangle_color: String,

    pub circle_size: i32,

    pub circle_color: String,

    pub time_visible_ms: i32,

    /// Triangle orientation: N, E, S or W.
    pub orientation: String,

    /// Owning user; null for generated/seeded stimuli.
    pub user_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
