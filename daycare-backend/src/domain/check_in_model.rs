// src/domain/check_in_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 登園・降園の打刻記録。`deleted_at` を持たず、作成時刻を基準に
/// 保持期間が計測される。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "check_ins")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(nullable)]
    pub child_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub recorded_by: Option<Uuid>,
    pub checked_in_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::child_model::Entity",
        from = "Column::ChildId",
        to = "super::child_model::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Child,
    #[sea_orm(
        belongs_to = "super::user_model::Entity",
        from = "Column::RecordedBy",
        to = "super::user_model::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    RecordedBy,
}

impl Related<super::child_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Child.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
