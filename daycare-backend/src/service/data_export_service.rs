// src/service/data_export_service.rs

//! Full personal-data export for one user: a read-only aggregation over
//! the user's owned records, plus one audit entry for the export itself.

use crate::domain::audit_log_model::AuditAction;
use crate::domain::retention_policy::EntityKind;
use crate::error::{AppError, AppResult};
use crate::repository::message_repository::MessageRepository;
use crate::repository::note_repository::NoteRepository;
use crate::repository::notification_repository::NotificationRepository;
use crate::repository::personal_task_repository::PersonalTaskRepository;
use crate::repository::user_repository::UserRepository;
use crate::service::audit_log_service::AuditLogService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct UserProfileExport {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub institution_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NoteExport {
    pub id: Uuid,
    pub child_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageExport {
    pub id: Uuid,
    pub recipient_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PersonalTaskExport {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NotificationExport {
    pub id: Uuid,
    pub kind: String,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserDataExport {
    pub user: UserProfileExport,
    pub notes: Vec<NoteExport>,
    pub messages: Vec<MessageExport>,
    pub personal_tasks: Vec<PersonalTaskExport>,
    pub notifications: Vec<NotificationExport>,
    pub exported_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct DataExportService {
    user_repo: Arc<UserRepository>,
    note_repo: Arc<NoteRepository>,
    message_repo: Arc<MessageRepository>,
    personal_task_repo: Arc<PersonalTaskRepository>,
    notification_repo: Arc<NotificationRepository>,
    audit_log_service: Arc<AuditLogService>,
}

impl DataExportService {
    pub fn new(
        user_repo: Arc<UserRepository>,
        note_repo: Arc<NoteRepository>,
        message_repo: Arc<MessageRepository>,
        personal_task_repo: Arc<PersonalTaskRepository>,
        notification_repo: Arc<NotificationRepository>,
        audit_log_service: Arc<AuditLogService>,
    ) -> Self {
        Self {
            user_repo,
            note_repo,
            message_repo,
            personal_task_repo,
            notification_repo,
            audit_log_service,
        }
    }

    pub async fn export_user(&self, user_id: Uuid, actor_id: Uuid) -> AppResult<UserDataExport> {
        // デフォルト読み取り：論理削除済みユーザーはエクスポート不可
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let notes = self.note_repo.find_by_author(user_id).await?;
        let messages = self.message_repo.find_by_sender(user_id).await?;
        let personal_tasks = self.personal_task_repo.find_by_user(user_id).await?;
        let notifications = self.notification_repo.find_by_user(user_id).await?;

        let export = UserDataExport {
            user: UserProfileExport {
                id: user.id,
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                role: user.role,
                institution_id: user.institution_id,
                created_at: user.created_at,
            },
            notes: notes
                .into_iter()
                .map(|n| NoteExport {
                    id: n.id,
                    child_id: n.child_id,
                    body: n.body,
                    created_at: n.created_at,
                })
                .collect(),
            messages: messages
                .into_iter()
                .map(|m| MessageExport {
                    id: m.id,
                    recipient_id: m.recipient_id,
                    subject: m.subject,
                    body: m.body,
                    created_at: m.created_at,
                })
                .collect(),
            personal_tasks: personal_tasks
                .into_iter()
                .map(|t| PersonalTaskExport {
                    id: t.id,
                    title: t.title,
                    done: t.done,
                    due_date: t.due_date,
                    created_at: t.created_at,
                })
                .collect(),
            notifications: notifications
                .into_iter()
                .map(|n| NotificationExport {
                    id: n.id,
                    kind: n.kind,
                    body: n.body,
                    read_at: n.read_at,
                    created_at: n.created_at,
                })
                .collect(),
            exported_at: Utc::now(),
        };

        self.audit_log_service
            .record(
                actor_id,
                AuditAction::DataExported,
                EntityKind::User.as_str(),
                Some(user_id),
                serde_json::json!({
                    "notes": export.notes.len(),
                    "messages": export.messages.len(),
                    "personal_tasks": export.personal_tasks.len(),
                    "notifications": export.notifications.len(),
                })
                .to_string(),
                export.user.institution_id,
            )
            .await?;

        info!(user_id = %user_id, actor_id = %actor_id, "User data exported");

        Ok(export)
    }
}
