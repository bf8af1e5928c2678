// src/domain/child_model.rs

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 園児。グループに所属し、施設スコープを持つ。
///
/// A child's parents are users, but soft-deleting a parent never touches
/// the child row; custody of the record stays with the institution.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "children")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(nullable)]
    pub group_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub institution_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    #[sea_orm(nullable)]
    pub parent_user_id: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group_model::Entity",
        from = "Column::GroupId",
        to = "super::group_model::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::user_model::Entity",
        from = "Column::ParentUserId",
        to = "super::user_model::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Parent,
    #[sea_orm(has_many = "super::check_in_model::Entity")]
    CheckIns,
}

impl Related<super::group_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::check_in_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckIns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
