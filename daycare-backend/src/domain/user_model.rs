// src/domain/user_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,

    pub first_name: String,

    pub last_name: String,

    /// PARENT / EDUCATOR / ADMIN / SUPER_ADMIN
    pub role: String,

    #[sea_orm(nullable)]
    pub institution_id: Option<Uuid>,

    pub deleted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::institution_model::Entity",
        from = "Column::InstitutionId",
        to = "super::institution_model::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Institution,

    #[sea_orm(has_many = "super::note_model::Entity")]
    Notes,

    #[sea_orm(has_many = "super::personal_task_model::Entity")]
    PersonalTasks,

    #[sea_orm(has_many = "super::notification_model::Entity")]
    Notifications,
}

impl Related<super::institution_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Institution.def()
    }
}

impl Related<super::note_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl Related<super::personal_task_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PersonalTasks.def()
    }
}

impl Related<super::notification_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
