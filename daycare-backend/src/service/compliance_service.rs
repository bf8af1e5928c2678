// src/service/compliance_service.rs

//! Compliance analytics derived from the audit trail.
//!
//! Strictly read-only: safe to call concurrently and repeatedly. The
//! aggregation, anomaly detection and scoring are pure functions over the
//! fetched entries so they can be tested without a store.

use crate::domain::audit_log_model::{AuditAction, Model as AuditLogModel};
use crate::domain::retention_policy::{retention_cutoff, EntityKind};
use crate::error::AppResult;
use crate::repository::audit_log_repository::AuditLogRepository;
use crate::repository::child_repository::ChildRepository;
use crate::repository::closed_day_repository::ClosedDayRepository;
use crate::repository::group_repository::GroupRepository;
use crate::repository::institution_repository::InstitutionRepository;
use crate::repository::message_repository::MessageRepository;
use crate::repository::note_repository::NoteRepository;
use crate::repository::notification_repository::NotificationRepository;
use crate::repository::personal_task_repository::PersonalTaskRepository;
use crate::repository::user_repository::UserRepository;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// 日次バケットが平均の何倍で異常とみなすか
const ANOMALY_THRESHOLD_MULTIPLIER: f64 = 3.0;
/// severity の境界（threshold に対する超過率）
const MEDIUM_SEVERITY_RATIO: f64 = 1.5;
const HIGH_SEVERITY_RATIO: f64 = 2.5;

/// 未解消 anomaly 1件あたりのスコア減点
const LOW_PENALTY: u32 = 3;
const MEDIUM_PENALTY: u32 = 8;
const HIGH_PENALTY: u32 = 15;
/// 期限超過・未パージ比率の最大減点
const STALE_RATIO_PENALTY: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub action: String,
    pub date: NaiveDate,
    pub count: u64,
    pub threshold: f64,
    pub severity: AnomalySeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub message: String,
    pub priority: RecommendationPriority,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub processing_events: u64,
    pub deletion_events: u64,
    pub export_events: u64,
    pub privacy_complaints: u64,
    pub soft_deleted_records: u64,
    pub overdue_unpurged_records: u64,
    pub anomalies: Vec<Anomaly>,
    pub compliance_score: u32,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ComplianceService {
    audit_log_repo: Arc<AuditLogRepository>,
    user_repo: Arc<UserRepository>,
    child_repo: Arc<ChildRepository>,
    group_repo: Arc<GroupRepository>,
    institution_repo: Arc<InstitutionRepository>,
    note_repo: Arc<NoteRepository>,
    message_repo: Arc<MessageRepository>,
    notification_repo: Arc<NotificationRepository>,
    personal_task_repo: Arc<PersonalTaskRepository>,
    closed_day_repo: Arc<ClosedDayRepository>,
}

pub struct ComplianceServiceRepos {
    pub audit_log_repo: Arc<AuditLogRepository>,
    pub user_repo: Arc<UserRepository>,
    pub child_repo: Arc<ChildRepository>,
    pub group_repo: Arc<GroupRepository>,
    pub institution_repo: Arc<InstitutionRepository>,
    pub note_repo: Arc<NoteRepository>,
    pub message_repo: Arc<MessageRepository>,
    pub notification_repo: Arc<NotificationRepository>,
    pub personal_task_repo: Arc<PersonalTaskRepository>,
    pub closed_day_repo: Arc<ClosedDayRepository>,
}

impl ComplianceService {
    pub fn new(repos: ComplianceServiceRepos) -> Self {
        Self {
            audit_log_repo: repos.audit_log_repo,
            user_repo: repos.user_repo,
            child_repo: repos.child_repo,
            group_repo: repos.group_repo,
            institution_repo: repos.institution_repo,
            note_repo: repos.note_repo,
            message_repo: repos.message_repo,
            notification_repo: repos.notification_repo,
            personal_task_repo: repos.personal_task_repo,
            closed_day_repo: repos.closed_day_repo,
        }
    }

    /// Generate a compliance report over the trailing `period_days`,
    /// optionally scoped to one institution.
    pub async fn generate_report(
        &self,
        institution_id: Option<Uuid>,
        period_days: u32,
    ) -> AppResult<ComplianceReport> {
        let period_days = period_days.clamp(1, 365);
        let period_end = Utc::now();
        let period_start = period_end - Duration::days(i64::from(period_days));

        let entries = self
            .audit_log_repo
            .find_in_period(period_start, period_end, institution_id)
            .await?;

        let counts = count_events(&entries);
        let anomalies = detect_anomalies(&entries, period_days);

        let (soft_deleted, overdue) = self.stale_record_counts(period_end).await?;

        let compliance_score = compliance_score(&anomalies, overdue, soft_deleted);
        let recommendations = build_recommendations(&counts, &anomalies, overdue, soft_deleted);

        Ok(ComplianceReport {
            period_start,
            period_end,
            processing_events: counts.processing,
            deletion_events: counts.deletion,
            export_events: counts.export,
            privacy_complaints: counts.complaints,
            soft_deleted_records: soft_deleted,
            overdue_unpurged_records: overdue,
            anomalies,
            compliance_score,
            recommendations,
            generated_at: period_end,
        })
    }

    /// Soft-deleted totals and how many of them are already past their
    /// retention window — stale data is a compliance defect even before
    /// the purge job runs.
    async fn stale_record_counts(&self, now: DateTime<Utc>) -> AppResult<(u64, u64)> {
        let mut soft_deleted = 0;
        let mut overdue = 0;

        soft_deleted += self.user_repo.count_soft_deleted().await?;
        overdue += self
            .user_repo
            .count_overdue(retention_cutoff(EntityKind::User, now, None))
            .await?;

        soft_deleted += self.child_repo.count_soft_deleted().await?;
        overdue += self
            .child_repo
            .count_overdue(retention_cutoff(EntityKind::Child, now, None))
            .await?;

        soft_deleted += self.group_repo.count_soft_deleted().await?;
        overdue += self
            .group_repo
            .count_overdue(retention_cutoff(EntityKind::Group, now, None))
            .await?;

        soft_deleted += self.institution_repo.count_soft_deleted().await?;
        overdue += self
            .institution_repo
            .count_overdue(retention_cutoff(EntityKind::Institution, now, None))
            .await?;

        soft_deleted += self.note_repo.count_soft_deleted().await?;
        overdue += self
            .note_repo
            .count_overdue(retention_cutoff(EntityKind::Note, now, None))
            .await?;

        soft_deleted += self.message_repo.count_soft_deleted().await?;
        overdue += self
            .message_repo
            .count_overdue(retention_cutoff(EntityKind::Message, now, None))
            .await?;

        soft_deleted += self.notification_repo.count_soft_deleted().await?;
        overdue += self
            .notification_repo
            .count_overdue(retention_cutoff(EntityKind::Notification, now, None))
            .await?;

        soft_deleted += self.personal_task_repo.count_soft_deleted().await?;
        overdue += self
            .personal_task_repo
            .count_overdue(retention_cutoff(EntityKind::PersonalTask, now, None))
            .await?;

        soft_deleted += self.closed_day_repo.count_soft_deleted().await?;
        overdue += self
            .closed_day_repo
            .count_overdue(retention_cutoff(EntityKind::ClosedDay, now, None))
            .await?;

        Ok((soft_deleted, overdue))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EventCounts {
    pub processing: u64,
    pub deletion: u64,
    pub export: u64,
    pub complaints: u64,
}

fn count_events(entries: &[AuditLogModel]) -> EventCounts {
    let mut counts = EventCounts::default();
    for entry in entries {
        match AuditAction::from_str(&entry.action) {
            Some(action) if action.is_deletion() => counts.deletion += 1,
            Some(action) if action.is_export() => counts.export += 1,
            Some(action) if action.is_complaint() => counts.complaints += 1,
            // 未知のアクションコードも処理イベントとして数える
            _ => counts.processing += 1,
        }
    }
    counts
}

/// Bucket entries per action per day; a day is anomalous when its count
/// exceeds `ANOMALY_THRESHOLD_MULTIPLIER` times the period mean for that
/// action.
fn detect_anomalies(entries: &[AuditLogModel], period_days: u32) -> Vec<Anomaly> {
    let mut buckets: BTreeMap<(String, NaiveDate), u64> = BTreeMap::new();
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();

    for entry in entries {
        let date = entry.created_at.date_naive();
        *buckets.entry((entry.action.clone(), date)).or_insert(0) += 1;
        *totals.entry(entry.action.clone()).or_insert(0) += 1;
    }

    let mut anomalies = Vec::new();
    let days = f64::from(period_days.max(1));

    for ((action, date), count) in &buckets {
        let mean = *totals.get(action).unwrap_or(&0) as f64 / days;
        let threshold = mean * ANOMALY_THRESHOLD_MULTIPLIER;
        if threshold > 0.0 && *count as f64 > threshold {
            let ratio = *count as f64 / threshold;
            let severity = if ratio >= HIGH_SEVERITY_RATIO {
                AnomalySeverity::High
            } else if ratio >= MEDIUM_SEVERITY_RATIO {
                AnomalySeverity::Medium
            } else {
                AnomalySeverity::Low
            };
            anomalies.push(Anomaly {
                action: action.clone(),
                date: *date,
                count: *count,
                threshold,
                severity,
            });
        }
    }

    anomalies
}

/// Score: start at 100, subtract fixed penalties per anomaly severity and
/// up to `STALE_RATIO_PENALTY` points for the overdue-but-unpurged share
/// of soft-deleted records. Clamped to 0..=100.
fn compliance_score(anomalies: &[Anomaly], overdue: u64, soft_deleted: u64) -> u32 {
    let mut penalty: f64 = 0.0;

    for anomaly in anomalies {
        penalty += f64::from(match anomaly.severity {
            AnomalySeverity::Low => LOW_PENALTY,
            AnomalySeverity::Medium => MEDIUM_PENALTY,
            AnomalySeverity::High => HIGH_PENALTY,
        });
    }

    if soft_deleted > 0 {
        penalty += STALE_RATIO_PENALTY * (overdue as f64 / soft_deleted as f64);
    }

    (100.0 - penalty).round().clamp(0.0, 100.0) as u32
}

/// Fixed rule table keyed on out-of-range metrics.
fn build_recommendations(
    counts: &EventCounts,
    anomalies: &[Anomaly],
    overdue: u64,
    soft_deleted: u64,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if anomalies
        .iter()
        .any(|a| a.severity == AnomalySeverity::High)
    {
        recommendations.push(Recommendation {
            message: "Investigate high-severity activity spikes in the audit trail".to_string(),
            priority: RecommendationPriority::High,
        });
    }

    if anomalies.len() >= 3 {
        recommendations.push(Recommendation {
            message: "Review data access patterns; multiple daily activity spikes detected"
                .to_string(),
            priority: RecommendationPriority::Medium,
        });
    }

    if soft_deleted > 0 && overdue as f64 / soft_deleted as f64 > 0.1 {
        recommendations.push(Recommendation {
            message: "Run retention cleanup: a significant share of soft-deleted records is past its retention window".to_string(),
            priority: RecommendationPriority::High,
        });
    }

    if counts.complaints > 0 {
        recommendations.push(Recommendation {
            message: "Follow up on recorded privacy complaints".to_string(),
            priority: RecommendationPriority::High,
        });
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::retention_policy::EntityKind;
    use chrono::TimeZone;

    fn entry(action: AuditAction, at: DateTime<Utc>) -> AuditLogModel {
        AuditLogModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            action: action.as_str().to_string(),
            entity_type: EntityKind::User.as_str().to_string(),
            entity_id: None,
            details: None,
            institution_id: None,
            created_at: at,
        }
    }

    #[test]
    fn empty_period_scores_perfect() {
        let anomalies = detect_anomalies(&[], 30);
        assert!(anomalies.is_empty());
        assert_eq!(compliance_score(&anomalies, 0, 0), 100);

        let counts = count_events(&[]);
        let recommendations = build_recommendations(&counts, &anomalies, 0, 0);
        assert!(recommendations.is_empty());
    }

    #[test]
    fn events_are_bucketed_by_class() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let entries = vec![
            entry(AuditAction::UserSoftDeleted, at),
            entry(AuditAction::RetentionCleanupRun, at),
            entry(AuditAction::DataExported, at),
            entry(AuditAction::PrivacyComplaintReceived, at),
            entry(AuditAction::GdprDeleteRequestCreated, at),
        ];
        let counts = count_events(&entries);
        assert_eq!(counts.deletion, 2);
        assert_eq!(counts.export, 1);
        assert_eq!(counts.complaints, 1);
        assert_eq!(counts.processing, 1);
    }

    #[test]
    fn burst_day_raises_anomaly_with_scaled_severity() {
        // 30 events on one day, 30-day period: mean 1/day, threshold 3.
        // 30 / 3 = 10x past the threshold -> HIGH.
        let burst_day = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let entries: Vec<_> = (0..30)
            .map(|_| entry(AuditAction::DataExported, burst_day))
            .collect();

        let anomalies = detect_anomalies(&entries, 30);
        assert_eq!(anomalies.len(), 1);
        let anomaly = &anomalies[0];
        assert_eq!(anomaly.count, 30);
        assert_eq!(anomaly.severity, AnomalySeverity::High);
        assert_eq!(anomaly.date, burst_day.date_naive());
    }

    #[test]
    fn evenly_spread_activity_is_not_anomalous() {
        let entries: Vec<_> = (0..30)
            .map(|day| {
                entry(
                    AuditAction::DataExported,
                    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
                        + Duration::days(day),
                )
            })
            .collect();
        assert!(detect_anomalies(&entries, 30).is_empty());
    }

    #[test]
    fn severity_tiers_follow_cut_points() {
        // mean = 12/30, threshold = 1.2; a 4-event day sits at ratio ~3.3.
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut entries = Vec::new();
        for day in 0..8 {
            entries.push(entry(AuditAction::DataExported, base + Duration::days(day)));
        }
        for _ in 0..4 {
            entries.push(entry(AuditAction::DataExported, base + Duration::days(20)));
        }

        let anomalies = detect_anomalies(&entries, 30);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].severity, AnomalySeverity::High);
    }

    #[test]
    fn score_penalizes_anomalies_and_stale_records() {
        let anomaly = Anomaly {
            action: "DATA_EXPORTED".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            count: 30,
            threshold: 3.0,
            severity: AnomalySeverity::High,
        };
        // 100 - 15 (high anomaly) - 15 (half of the stale penalty) = 70
        assert_eq!(compliance_score(&[anomaly], 5, 10), 70);
    }

    #[test]
    fn score_never_goes_below_zero() {
        let anomalies: Vec<_> = (0..10u32)
            .map(|i| Anomaly {
                action: "DATA_EXPORTED".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 3, 1 + i).unwrap(),
                count: 100,
                threshold: 1.0,
                severity: AnomalySeverity::High,
            })
            .collect();
        assert_eq!(compliance_score(&anomalies, 10, 10), 0);
    }

    #[test]
    fn stale_ratio_triggers_cleanup_recommendation() {
        let counts = EventCounts::default();
        let recommendations = build_recommendations(&counts, &[], 5, 10);
        assert!(recommendations
            .iter()
            .any(|r| r.priority == RecommendationPriority::High
                && r.message.contains("retention cleanup")));
    }
}
