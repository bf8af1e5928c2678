// src/domain/audit_log_model.rs
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit trail of every privacy-relevant action. Rows are never
/// updated; the only deletion path is the retention purge after the audit
/// log's own window.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Acting user. `Uuid::nil()` denotes the system actor (scheduled jobs).
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
    pub institution_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 監査アクションの定義（閉じた語彙）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditAction {
    UserSoftDeleted,
    ChildSoftDeleted,
    GroupSoftDeleted,
    InstitutionSoftDeleted,
    GdprDeleteRequestCreated,
    GdprDeleteRequestApproved,
    GdprDeleteRequestRejected,
    DataExported,
    RetentionCleanupRun,
    BackupVerified,
    PrivacyComplaintReceived,
}

impl AuditAction {
    pub const ALL: [AuditAction; 11] = [
        AuditAction::UserSoftDeleted,
        AuditAction::ChildSoftDeleted,
        AuditAction::GroupSoftDeleted,
        AuditAction::InstitutionSoftDeleted,
        AuditAction::GdprDeleteRequestCreated,
        AuditAction::GdprDeleteRequestApproved,
        AuditAction::GdprDeleteRequestRejected,
        AuditAction::DataExported,
        AuditAction::RetentionCleanupRun,
        AuditAction::BackupVerified,
        AuditAction::PrivacyComplaintReceived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserSoftDeleted => "USER_SOFT_DELETED",
            AuditAction::ChildSoftDeleted => "CHILD_SOFT_DELETED",
            AuditAction::GroupSoftDeleted => "GROUP_SOFT_DELETED",
            AuditAction::InstitutionSoftDeleted => "INSTITUTION_SOFT_DELETED",
            AuditAction::GdprDeleteRequestCreated => "GDPR_DELETE_REQUEST_CREATED",
            AuditAction::GdprDeleteRequestApproved => "GDPR_DELETE_REQUEST_APPROVED",
            AuditAction::GdprDeleteRequestRejected => "GDPR_DELETE_REQUEST_REJECTED",
            AuditAction::DataExported => "DATA_EXPORTED",
            AuditAction::RetentionCleanupRun => "RETENTION_CLEANUP_RUN",
            AuditAction::BackupVerified => "BACKUP_VERIFIED",
            AuditAction::PrivacyComplaintReceived => "PRIVACY_COMPLAINT_RECEIVED",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == value)
    }

    /// Deletion-class actions (soft deletes and purge runs), as bucketed by
    /// the compliance report.
    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            AuditAction::UserSoftDeleted
                | AuditAction::ChildSoftDeleted
                | AuditAction::GroupSoftDeleted
                | AuditAction::InstitutionSoftDeleted
                | AuditAction::RetentionCleanupRun
        )
    }

    pub fn is_export(&self) -> bool {
        matches!(self, AuditAction::DataExported)
    }

    pub fn is_complaint(&self) -> bool {
        matches!(self, AuditAction::PrivacyComplaintReceived)
    }
}

// 監査ログエントリービルダー
pub struct AuditLogBuilder {
    user_id: Uuid,
    action: AuditAction,
    entity_type: String,
    entity_id: Option<Uuid>,
    details: Option<String>,
    institution_id: Option<Uuid>,
}

impl AuditLogBuilder {
    pub fn new(user_id: Uuid, action: AuditAction, entity_type: impl Into<String>) -> Self {
        Self {
            user_id,
            action,
            entity_type: entity_type.into(),
            entity_id: None,
            details: None,
            institution_id: None,
        }
    }

    pub fn entity_id(mut self, id: Uuid) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn institution_id(mut self, id: Uuid) -> Self {
        self.institution_id = Some(id);
        self
    }

    pub fn build(self) -> ActiveModel {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(self.user_id),
            action: Set(self.action.as_str().to_string()),
            entity_type: Set(self.entity_type),
            entity_id: Set(self.entity_id),
            details: Set(self.details),
            institution_id: Set(self.institution_id),
            created_at: Set(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_codes_round_trip() {
        for action in AuditAction::ALL {
            assert_eq!(AuditAction::from_str(action.as_str()), Some(action));
        }
        assert_eq!(AuditAction::from_str("USER_DELETED"), None);
    }

    #[test]
    fn compliance_buckets_are_disjoint() {
        for action in AuditAction::ALL {
            let buckets = [action.is_deletion(), action.is_export(), action.is_complaint()];
            assert!(buckets.iter().filter(|b| **b).count() <= 1);
        }
    }
}
