// src/repository/mod.rs

pub mod activity_log_repository;
pub mod audit_log_repository;
pub mod check_in_repository;
pub mod child_repository;
pub mod closed_day_repository;
pub mod deletion_request_repository;
pub mod failed_login_repository;
pub mod group_repository;
pub mod institution_repository;
pub mod message_repository;
pub mod note_repository;
pub mod notification_repository;
pub mod personal_task_repository;
pub mod user_repository;
