// src/api/dto/gdpr_dto.rs

use crate::domain::retention_policy::RetentionPolicy;
use crate::service::purge_service::PendingDeletionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// ソフトデリート要求ボディ
#[derive(Debug, Deserialize, Validate)]
pub struct SoftDeleteRequest {
    #[validate(length(min = 1, message = "A reason is required"))]
    pub reason: String,
}

/// 手動パージ要求ボディ
#[derive(Debug, Deserialize, Validate)]
pub struct CleanupRequest {
    /// Override for every entity kind's retention window, in whole
    /// months. Omit to use the configured per-kind policies.
    #[validate(range(min = 1, max = 120))]
    pub retention_months: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AuditLogQueryParams {
    pub limit: Option<u64>,
    pub action: Option<String>,
    pub actor: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportQueryParams {
    /// `inline` (default) or `attachment`.
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PendingDeletionsResponse {
    pub records: Vec<PendingDeletionRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct RetentionPoliciesResponse {
    pub policies: Vec<RetentionPolicy>,
}
