// src/domain/message_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(nullable)]
    pub sender_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub recipient_id: Option<Uuid>,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_model::Entity",
        from = "Column::SenderId",
        to = "super::user_model::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::user_model::Entity",
        from = "Column::RecipientId",
        to = "super::user_model::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Recipient,
}

impl ActiveModelBehavior for ActiveModel {}
