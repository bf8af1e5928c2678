// src/api/mod.rs
use crate::config::Config;
use crate::db::DbPool;
use crate::repository::activity_log_repository::ActivityLogRepository;
use crate::repository::audit_log_repository::AuditLogRepository;
use crate::repository::check_in_repository::CheckInRepository;
use crate::repository::child_repository::ChildRepository;
use crate::repository::closed_day_repository::ClosedDayRepository;
use crate::repository::deletion_request_repository::DeletionRequestRepository;
use crate::repository::failed_login_repository::FailedLoginRepository;
use crate::repository::group_repository::GroupRepository;
use crate::repository::institution_repository::InstitutionRepository;
use crate::repository::message_repository::MessageRepository;
use crate::repository::note_repository::NoteRepository;
use crate::repository::notification_repository::NotificationRepository;
use crate::repository::personal_task_repository::PersonalTaskRepository;
use crate::repository::user_repository::UserRepository;
use crate::service::audit_log_service::AuditLogService;
use crate::service::backup_service::BackupService;
use crate::service::compliance_service::{ComplianceService, ComplianceServiceRepos};
use crate::service::data_export_service::DataExportService;
use crate::service::deletion_request_service::DeletionRequestService;
use crate::service::purge_service::{PurgeService, PurgeServiceRepos};
use crate::service::soft_delete_service::SoftDeleteService;
use std::sync::Arc;

pub mod dto;
pub mod handlers;

/// 統一されたアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub soft_delete_service: Arc<SoftDeleteService>,
    pub purge_service: Arc<PurgeService>,
    pub deletion_request_service: Arc<DeletionRequestService>,
    pub audit_log_service: Arc<AuditLogService>,
    pub compliance_service: Arc<ComplianceService>,
    pub backup_service: Arc<BackupService>,
    pub data_export_service: Arc<DataExportService>,
    pub jwt_secret: String,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    pub fn new(db: DbPool, config: &Config) -> Self {
        let user_repo = Arc::new(UserRepository::new(db.clone()));
        let child_repo = Arc::new(ChildRepository::new(db.clone()));
        let group_repo = Arc::new(GroupRepository::new(db.clone()));
        let institution_repo = Arc::new(InstitutionRepository::new(db.clone()));
        let note_repo = Arc::new(NoteRepository::new(db.clone()));
        let message_repo = Arc::new(MessageRepository::new(db.clone()));
        let notification_repo = Arc::new(NotificationRepository::new(db.clone()));
        let personal_task_repo = Arc::new(PersonalTaskRepository::new(db.clone()));
        let closed_day_repo = Arc::new(ClosedDayRepository::new(db.clone()));
        let check_in_repo = Arc::new(CheckInRepository::new(db.clone()));
        let failed_login_repo = Arc::new(FailedLoginRepository::new(db.clone()));
        let activity_log_repo = Arc::new(ActivityLogRepository::new(db.clone()));
        let audit_log_repo = Arc::new(AuditLogRepository::new(db.clone()));
        let deletion_request_repo = Arc::new(DeletionRequestRepository::new(db.clone()));

        let audit_log_service = Arc::new(AuditLogService::new(
            audit_log_repo.clone(),
            user_repo.clone(),
        ));

        let soft_delete_service = Arc::new(SoftDeleteService::new(
            db.clone(),
            user_repo.clone(),
            child_repo.clone(),
            group_repo.clone(),
            institution_repo.clone(),
            audit_log_service.clone(),
        ));

        let purge_service = Arc::new(PurgeService::new(
            db.clone(),
            PurgeServiceRepos {
                user_repo: user_repo.clone(),
                child_repo: child_repo.clone(),
                group_repo: group_repo.clone(),
                institution_repo: institution_repo.clone(),
                note_repo: note_repo.clone(),
                message_repo: message_repo.clone(),
                notification_repo: notification_repo.clone(),
                personal_task_repo: personal_task_repo.clone(),
                closed_day_repo: closed_day_repo.clone(),
                check_in_repo: check_in_repo.clone(),
                failed_login_repo,
                activity_log_repo,
                audit_log_repo: audit_log_repo.clone(),
            },
            audit_log_service.clone(),
        ));

        let deletion_request_service = Arc::new(DeletionRequestService::new(
            db.clone(),
            deletion_request_repo,
            user_repo.clone(),
            soft_delete_service.clone(),
            audit_log_service.clone(),
        ));

        let compliance_service = Arc::new(ComplianceService::new(ComplianceServiceRepos {
            audit_log_repo: audit_log_repo.clone(),
            user_repo: user_repo.clone(),
            child_repo: child_repo.clone(),
            group_repo,
            institution_repo,
            note_repo: note_repo.clone(),
            message_repo: message_repo.clone(),
            notification_repo: notification_repo.clone(),
            personal_task_repo: personal_task_repo.clone(),
            closed_day_repo,
        }));

        let backup_service = Arc::new(BackupService::new(
            config.backup_dir.clone(),
            user_repo.clone(),
            child_repo,
            check_in_repo,
            audit_log_repo,
            audit_log_service.clone(),
        ));

        let data_export_service = Arc::new(DataExportService::new(
            user_repo,
            note_repo,
            message_repo,
            personal_task_repo,
            notification_repo,
            audit_log_service.clone(),
        ));

        Self {
            soft_delete_service,
            purge_service,
            deletion_request_service,
            audit_log_service,
            compliance_service,
            backup_service,
            data_export_service,
            jwt_secret: config.jwt_secret.clone(),
        }
    }
}
