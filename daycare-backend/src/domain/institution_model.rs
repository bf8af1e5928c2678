// src/domain/institution_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 保育施設。Group と ClosedDay のオーナー。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "institutions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Soft-delete marker. A non-null value hides the row from every
    /// default read and starts its retention clock.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_model::Entity")]
    Groups,
    #[sea_orm(has_many = "super::closed_day_model::Entity")]
    ClosedDays,
}

impl Related<super::group_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::closed_day_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClosedDays.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
