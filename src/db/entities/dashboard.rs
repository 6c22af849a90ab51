use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dashboards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    // Unique per owner by check-then-create only; there is no compound
    // unique index backing it.
    pub name: String,
    /// Ordered widget-position records, opaque to the backend.
    pub layout: Json,
    /// Widget id string -> widget descriptor, opaque to the backend.
    pub items: Json,
    /// Monotonic widget-id allocator; must stay above every numeric id in `items`.
    pub next_id: i32,
    pub shared: bool,
    // Share password, stored verbatim. Hidden from serialized output; the
    // public password-check path is the only reader.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub views: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    Owner,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
