// src/domain/deletion_request_model.rs
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 却下理由を既存の理由に連結するときの区切り文字列。
pub const REJECTION_SEPARATOR: &str = " | rejected: ";

/// Status of a deletion request. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeletionRequestStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl DeletionRequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeletionRequestStatus::Pending)
    }
}

/// A reviewer-arbitrated request to soft-delete a user account.
///
/// Target and requester are plain UUIDs rather than foreign keys: the
/// request is part of the compliance record and must survive the purge of
/// the accounts it refers to.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deletion_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub target_user_id: Uuid,
    pub requester_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub status: DeletionRequestStatus,
    pub reviewer_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Rejection keeps the original reason and appends the reviewer's one
/// behind the fixed separator.
pub fn append_rejection(reason: &str, rejection: &str) -> String {
    format!("{}{}{}", reason, REJECTION_SEPARATOR, rejection.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_non_terminal_state() {
        assert!(!DeletionRequestStatus::Pending.is_terminal());
        assert!(DeletionRequestStatus::Approved.is_terminal());
        assert!(DeletionRequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn rejection_reason_uses_the_fixed_separator() {
        let combined = append_rejection("account no longer used", "  parent withdrew consent ");
        assert_eq!(
            combined,
            "account no longer used | rejected: parent withdrew consent"
        );
    }
}
